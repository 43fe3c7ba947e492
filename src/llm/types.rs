//! Request/response types for the generation pipeline.
//!
//! A `GenerationRequest` compiles into a `CompiledPrompt`; the gateway turns
//! that into a `GenerationResult` whose populated fields depend on the
//! operation kind.

use super::schema::SchemaDescriptor;
use crate::config::EditorialSettings;
use serde::{Deserialize, Serialize};

/// Number of headline options a full generation asks for.
pub const FULL_TITLE_COUNT: usize = 3;

/// Hashtag bounds for a full generation, after normalization.
pub const FULL_HASHTAG_MIN: usize = 5;
pub const FULL_HASHTAG_MAX: usize = 8;

/// Which part of the bundle a call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    /// Titles, hashtags and article from source text.
    Full,
    /// Fresh headlines for an approved article.
    Titles,
    /// Fresh hashtags for an approved article.
    Hashtags,
    /// Rewrite of an existing article.
    Article,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Full => "FULL",
            OperationKind::Titles => "TITLES",
            OperationKind::Hashtags => "HASHTAGS",
            OperationKind::Article => "ARTICLE",
        }
    }

    /// Regenerations operate on an existing article and always vary.
    pub fn is_regeneration(self) -> bool {
        !matches!(self, OperationKind::Full)
    }
}

/// Everything the prompt compiler needs for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub operation: OperationKind,
    pub source_text: String,
    #[serde(default)]
    pub context: Option<String>,
    pub settings: EditorialSettings,
    /// Required for every regeneration kind.
    #[serde(default)]
    pub prior_article: Option<String>,
    /// Number of titles wanted (TITLES only).
    #[serde(default)]
    pub count_hint: Option<usize>,
}

impl GenerationRequest {
    pub fn full(
        source_text: impl Into<String>,
        context: Option<String>,
        settings: EditorialSettings,
    ) -> Self {
        Self {
            operation: OperationKind::Full,
            source_text: source_text.into(),
            context,
            settings,
            prior_article: None,
            count_hint: None,
        }
    }

    pub fn titles(
        source_text: impl Into<String>,
        article: impl Into<String>,
        settings: EditorialSettings,
        count: usize,
    ) -> Self {
        Self {
            operation: OperationKind::Titles,
            source_text: source_text.into(),
            context: None,
            settings,
            prior_article: Some(article.into()),
            count_hint: Some(count),
        }
    }

    pub fn hashtags(
        source_text: impl Into<String>,
        article: impl Into<String>,
        settings: EditorialSettings,
    ) -> Self {
        Self {
            operation: OperationKind::Hashtags,
            source_text: source_text.into(),
            context: None,
            settings,
            prior_article: Some(article.into()),
            count_hint: None,
        }
    }

    pub fn article(
        source_text: impl Into<String>,
        context: Option<String>,
        prior_article: impl Into<String>,
        settings: EditorialSettings,
    ) -> Self {
        Self {
            operation: OperationKind::Article,
            source_text: source_text.into(),
            context,
            settings,
            prior_article: Some(prior_article.into()),
            count_hint: None,
        }
    }

    /// Context with whitespace-only values treated as absent.
    pub fn effective_context(&self) -> Option<&str> {
        self.context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Titles requested from the model for this operation.
    pub fn title_count(&self) -> usize {
        match self.operation {
            OperationKind::Titles => self.count_hint.unwrap_or(FULL_TITLE_COUNT).max(1),
            _ => FULL_TITLE_COUNT,
        }
    }
}

/// Post-parse rules a response must satisfy beyond the schema shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputContract {
    /// Exact number of titles to return, when titles are requested.
    pub title_count: Option<usize>,
    /// Hashtag tokens already present verbatim in the source text; these
    /// may legitimately appear in the article body.
    pub source_hashtags: Vec<String>,
}

/// A fully rendered model request. Identical requests compile to
/// byte-identical prompts, which is what the result cache keys on.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPrompt {
    pub operation: OperationKind,
    pub system_instruction: String,
    pub task_prompt: String,
    pub schema: &'static SchemaDescriptor,
    pub contract: OutputContract,
}

/// Structured output of one generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
}

impl GenerationResult {
    pub fn titles(&self) -> &[String] {
        self.titles.as_deref().unwrap_or_default()
    }

    pub fn hashtags(&self) -> &[String] {
        self.hashtags.as_deref().unwrap_or_default()
    }

    pub fn article(&self) -> &str {
        self.article.as_deref().unwrap_or_default()
    }
}
