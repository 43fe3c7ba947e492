//! Generation gateway: the only caller of the model endpoint.
//!
//! `execute` checks the credential, consults the result cache when allowed,
//! calls the endpoint, and validates the raw output against the compiled
//! prompt's schema and output contract before anything reaches the caller.

use super::error::GenerationError;
use super::hashtags;
use super::provider::{ModelEndpoint, StructuredCall};
use super::schema::Field;
use super::types::{
    CompiledPrompt, GenerationResult, OperationKind, OutputContract, FULL_HASHTAG_MAX,
    FULL_HASHTAG_MIN,
};
use crate::cache::{self, ResultCache};
use crate::credentials::GatewayConfig;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct Gateway {
    endpoint: Arc<dyn ModelEndpoint>,
    cache: Option<ResultCache>,
}

impl Gateway {
    pub fn new(endpoint: Arc<dyn ModelEndpoint>) -> Self {
        Self {
            endpoint,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Run one compiled prompt.
    ///
    /// With `allow_cache`, a live cache hit is returned verbatim and no call
    /// is made; a fresh, valid result is written back under the same
    /// fingerprint. Failures are never retried here.
    pub async fn execute(
        &self,
        prompt: &CompiledPrompt,
        config: &GatewayConfig,
        allow_cache: bool,
    ) -> Result<GenerationResult, GenerationError> {
        let api_key = config.usable_key().ok_or_else(|| {
            log::error!("[GATEWAY] No API key configured");
            GenerationError::MissingCredential
        })?;

        let cache = self.cache.as_ref().filter(|_| allow_cache);
        let fingerprint = cache.map(|_| cache::fingerprint(prompt, &config.model));

        if let (Some(cache), Some(fp)) = (cache, fingerprint.as_deref()) {
            if let Some(hit) = cache.get(fp).await {
                log::info!(
                    "[GATEWAY] {} cache hit ({}, {})",
                    prompt.operation.as_str(),
                    config.model,
                    &fp[..12.min(fp.len())]
                );
                return Ok(hit);
            }
            log::info!("[GATEWAY] {} cache miss", prompt.operation.as_str());
        }

        let start = std::time::Instant::now();
        log::info!(
            "[GATEWAY] Calling {} model={} op={}",
            self.endpoint.name(),
            config.model,
            prompt.operation.as_str()
        );

        let raw = self
            .endpoint
            .generate_structured(StructuredCall {
                api_base: &config.api_base,
                model: &config.model,
                api_key,
                system_instruction: &prompt.system_instruction,
                task_prompt: &prompt.task_prompt,
                schema: prompt.schema,
            })
            .await?;

        let result = parse_response(&raw, prompt).map_err(|e| {
            log::warn!("[GATEWAY] Rejected {} response: {}", prompt.operation.as_str(), e);
            e
        })?;

        log::info!(
            "[GATEWAY] {} done in {}ms",
            prompt.operation.as_str(),
            start.elapsed().as_millis()
        );

        if let (Some(cache), Some(fp)) = (cache, fingerprint.as_deref()) {
            cache.put(fp, &result).await;
        }
        Ok(result)
    }
}

/// Validate raw model text against the prompt's schema and contract.
pub fn parse_response(raw: &str, prompt: &CompiledPrompt) -> Result<GenerationResult, GenerationError> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| GenerationError::SchemaViolation(format!("not valid JSON: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| GenerationError::SchemaViolation("top level is not an object".into()))?;

    let mut result = GenerationResult::default();
    for spec in prompt.schema.fields {
        // Undeclared fields are never read, so they are discarded here.
        match spec.field {
            Field::Titles => {
                let titles = string_list(object, Field::Titles)?;
                result.titles = Some(enforce_title_count(titles, prompt)?);
            }
            Field::Hashtags => {
                let tags = hashtags::normalize(&string_list(object, Field::Hashtags)?);
                result.hashtags = Some(enforce_hashtag_count(tags, prompt.operation)?);
            }
            Field::Article => {
                let article = required_string(object, Field::Article)?;
                result.article = Some(clean_article(&article, &prompt.contract)?);
            }
        }
    }
    Ok(result)
}

/// Trim surrounding whitespace and a Markdown code fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening fence line.
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn string_list(object: &Map<String, Value>, field: Field) -> Result<Vec<String>, GenerationError> {
    let items = match object.get(field.name()) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(GenerationError::SchemaViolation(format!(
                "`{}` is not an array",
                field.name()
            )))
        }
        None => {
            return Err(GenerationError::SchemaViolation(format!(
                "missing required field `{}`",
                field.name()
            )))
        }
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let s = item.as_str().ok_or_else(|| {
            GenerationError::SchemaViolation(format!("`{}` contains a non-string entry", field.name()))
        })?;
        let s = s.trim();
        if !s.is_empty() {
            out.push(s.to_string());
        }
    }
    if out.is_empty() {
        return Err(GenerationError::SchemaViolation(format!(
            "`{}` is empty",
            field.name()
        )));
    }
    Ok(out)
}

fn required_string(object: &Map<String, Value>, field: Field) -> Result<String, GenerationError> {
    match object.get(field.name()) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(GenerationError::SchemaViolation(format!(
            "`{}` is empty",
            field.name()
        ))),
        Some(_) => Err(GenerationError::SchemaViolation(format!(
            "`{}` is not a string",
            field.name()
        ))),
        None => Err(GenerationError::SchemaViolation(format!(
            "missing required field `{}`",
            field.name()
        ))),
    }
}

/// At least `title_count` titles are required; extras are dropped.
fn enforce_title_count(
    mut titles: Vec<String>,
    prompt: &CompiledPrompt,
) -> Result<Vec<String>, GenerationError> {
    let Some(wanted) = prompt.contract.title_count else {
        return Ok(titles);
    };
    if titles.len() < wanted {
        return Err(GenerationError::SchemaViolation(format!(
            "asked for {} titles, got {}",
            wanted,
            titles.len()
        )));
    }
    titles.truncate(wanted);
    Ok(titles)
}

/// FULL needs `FULL_HASHTAG_MIN` distinct tags and keeps at most
/// `FULL_HASHTAG_MAX`. HASHTAGS only needs one.
fn enforce_hashtag_count(
    mut tags: Vec<String>,
    operation: OperationKind,
) -> Result<Vec<String>, GenerationError> {
    let min = match operation {
        OperationKind::Full => FULL_HASHTAG_MIN,
        _ => 1,
    };
    if tags.len() < min {
        return Err(GenerationError::SchemaViolation(format!(
            "asked for at least {} hashtags, got {} usable",
            min,
            tags.len()
        )));
    }
    if operation == OperationKind::Full {
        tags.truncate(FULL_HASHTAG_MAX);
    }
    Ok(tags)
}

/// Strip trailing tag-only lines; any remaining tag token must already be
/// in the source text.
fn clean_article(article: &str, contract: &OutputContract) -> Result<String, GenerationError> {
    let cleaned = hashtags::strip_trailing_tag_lines(article);
    if cleaned.trim().is_empty() {
        return Err(GenerationError::SchemaViolation("`article` is empty".into()));
    }
    let stray = hashtags::stray_tokens(&cleaned, &contract.source_hashtags);
    if !stray.is_empty() {
        return Err(GenerationError::SchemaViolation(format!(
            "article body contains hashtags: {}",
            stray.join(" ")
        )));
    }
    Ok(cleaned)
}
