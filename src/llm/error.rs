//! Failure taxonomy for generation calls.

use thiserror::Error;

/// Stable user-facing text for provider misbehaviour.
pub const INVALID_RESPONSE_MESSAGE: &str =
    "Failed to get a valid response from the AI. Please check your API key and input.";

/// Corrective text shown when every title is locked.
pub const NOTHING_TO_REGENERATE_MESSAGE: &str =
    "All titles are selected. Uncheck at least one to regenerate.";

/// Every way a generation or regeneration can fail.
///
/// None of these are retried inside the crate; the caller decides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No API key configured.
    #[error("No API key configured. Set GEMINI_API_KEY or save a key with `newsdesk login`.")]
    MissingCredential,

    /// A regeneration was requested without the article it operates on.
    #[error("No article to regenerate from. Generate an article first.")]
    MissingPriorArticle,

    /// Network or HTTP failure reaching the model.
    #[error("Model request failed: {0}")]
    Transport(String),

    /// The model answered with no content.
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// The model's output did not match the requested schema or contract.
    #[error("Model response violated the output schema: {0}")]
    SchemaViolation(String),

    /// Every title is locked; nothing to refill.
    #[error("{}", NOTHING_TO_REGENERATE_MESSAGE)]
    NothingToRegenerate,
}

impl GenerationError {
    /// Message suitable for end users. Raw parse details from the provider
    /// are not leaked.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::EmptyResponse | GenerationError::SchemaViolation(_) => {
                INVALID_RESPONSE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Configuration-class errors are fatal to the operation and not worth
    /// offering a retry for.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GenerationError::MissingCredential | GenerationError::MissingPriorArticle
        )
    }

    /// Transport and provider failures may succeed on a manual retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Transport(_)
                | GenerationError::EmptyResponse
                | GenerationError::SchemaViolation(_)
        )
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::Transport(e.to_string())
    }
}
