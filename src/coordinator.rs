//! Regeneration coordinator.
//!
//! Turns "regenerate this part" into the minimum set of gateway calls and
//! merges fresh output back without disturbing what the user kept:
//!   - titles: refill only unlocked positions, in order
//!   - hashtags: full replacement
//!   - article: full replacement, optionally cascading into new hashtags
//!     derived from the rewritten text
//!
//! Every regeneration bypasses the result cache.

use crate::config::EditorialSettings;
use crate::credentials::GatewayConfig;
use crate::llm::compile::compile;
use crate::llm::error::GenerationError;
use crate::llm::gateway::Gateway;
use crate::llm::types::{GenerationRequest, GenerationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Inputs a bundle is generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMaterial {
    pub source_text: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub settings: EditorialSettings,
}

impl SourceMaterial {
    pub fn new(
        source_text: impl Into<String>,
        context: Option<String>,
        settings: EditorialSettings,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            context,
            settings,
        }
    }
}

/// Outcome of an article rewrite.
///
/// The article is replaced even when the cascaded hashtag refresh fails;
/// the two have independent failure domains.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRewrite {
    pub article: String,
    /// `None` when no cascade was requested.
    pub hashtags: Option<Result<Vec<String>, GenerationError>>,
}

/// Positions whose title is not locked, in list order.
///
/// Locking is by value: a title equal to any locked title is kept wherever
/// it sits. Fails with `NothingToRegenerate` when every position is locked.
pub fn plan_title_refill(titles: &[String], locked: &[String]) -> Result<Vec<usize>, GenerationError> {
    let locked: HashSet<&str> = locked.iter().map(String::as_str).collect();
    let positions: Vec<usize> = titles
        .iter()
        .enumerate()
        .filter(|(_, t)| !locked.contains(t.as_str()))
        .map(|(i, _)| i)
        .collect();
    if positions.is_empty() {
        return Err(GenerationError::NothingToRegenerate);
    }
    Ok(positions)
}

/// Fresh titles must differ from each other and from every title that
/// stays in place. Compared trimmed and case-insensitively.
pub fn check_fresh_titles(
    titles: &[String],
    positions: &[usize],
    fresh: &[String],
) -> Result<(), GenerationError> {
    let mut seen: HashSet<String> = titles
        .iter()
        .enumerate()
        .filter(|(i, _)| !positions.contains(i))
        .map(|(_, t)| t.trim().to_lowercase())
        .collect();
    for title in fresh.iter().take(positions.len()) {
        if !seen.insert(title.trim().to_lowercase()) {
            return Err(GenerationError::SchemaViolation(format!(
                "regenerated title repeats an existing one: {}",
                title
            )));
        }
    }
    Ok(())
}

/// Write `fresh[i]` into `titles[positions[i]]`. Locked positions and any
/// position without a fresh counterpart are left untouched.
pub fn merge_titles(titles: &[String], positions: &[usize], fresh: &[String]) -> Vec<String> {
    let mut merged = titles.to_vec();
    for (&pos, title) in positions.iter().zip(fresh) {
        if let Some(slot) = merged.get_mut(pos) {
            *slot = title.clone();
        }
    }
    merged
}

#[derive(Clone)]
pub struct Coordinator {
    gateway: Gateway,
}

impl Coordinator {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// FULL generation. Cacheable unless `allow_cache` is false.
    pub async fn generate(
        &self,
        material: &SourceMaterial,
        config: &GatewayConfig,
        allow_cache: bool,
    ) -> Result<GenerationResult, GenerationError> {
        let request = GenerationRequest::full(
            material.source_text.clone(),
            material.context.clone(),
            material.settings.clone(),
        );
        let prompt = compile(&request)?;
        self.gateway.execute(&prompt, config, allow_cache).await
    }

    /// Refill every unlocked title. Returns the full merged list.
    ///
    /// No call is made when all titles are locked.
    pub async fn regenerate_titles(
        &self,
        material: &SourceMaterial,
        current: &GenerationResult,
        locked: &[String],
        config: &GatewayConfig,
    ) -> Result<Vec<String>, GenerationError> {
        let titles = current.titles();
        let positions = plan_title_refill(titles, locked)?;
        log::info!(
            "[COORD] Refilling {} of {} titles",
            positions.len(),
            titles.len()
        );

        let request = GenerationRequest::titles(
            material.source_text.clone(),
            current.article(),
            material.settings.clone(),
            positions.len(),
        );
        let prompt = compile(&request)?;
        let fresh = self.gateway.execute(&prompt, config, false).await?;
        check_fresh_titles(titles, &positions, fresh.titles()).map_err(|e| {
            log::warn!("[COORD] Rejected title refill: {}", e);
            e
        })?;
        Ok(merge_titles(titles, &positions, fresh.titles()))
    }

    /// Replace the whole hashtag list, derived from `article`.
    pub async fn regenerate_hashtags(
        &self,
        material: &SourceMaterial,
        article: &str,
        config: &GatewayConfig,
    ) -> Result<Vec<String>, GenerationError> {
        let request = GenerationRequest::hashtags(
            material.source_text.clone(),
            article,
            material.settings.clone(),
        );
        let prompt = compile(&request)?;
        let fresh = self.gateway.execute(&prompt, config, false).await?;
        Ok(fresh.hashtags().to_vec())
    }

    /// Rewrite the article. With `cascade`, hashtags are then refreshed
    /// from the new text; that failure is reported alongside, not instead.
    pub async fn regenerate_article(
        &self,
        material: &SourceMaterial,
        prior_article: &str,
        config: &GatewayConfig,
        cascade: bool,
    ) -> Result<ArticleRewrite, GenerationError> {
        let request = GenerationRequest::article(
            material.source_text.clone(),
            material.context.clone(),
            prior_article,
            material.settings.clone(),
        );
        let prompt = compile(&request)?;
        let fresh = self.gateway.execute(&prompt, config, false).await?;
        let article = fresh.article().to_string();

        let hashtags = if cascade {
            let refreshed = self.regenerate_hashtags(material, &article, config).await;
            if let Err(e) = &refreshed {
                log::warn!("[COORD] Hashtag refresh after rewrite failed: {}", e);
            }
            Some(refreshed)
        } else {
            None
        };

        Ok(ArticleRewrite { article, hashtags })
    }
}
