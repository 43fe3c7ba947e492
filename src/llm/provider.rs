//! Model endpoint trait: the one seam between the gateway and the network.
//!
//! The gateway never builds HTTP requests itself; it hands a
//! `StructuredCall` to whatever `ModelEndpoint` it was given. Production
//! uses `GeminiEndpoint`, tests use scripted fakes.

use super::error::GenerationError;
use super::schema::SchemaDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

/// One schema-constrained generation call.
#[derive(Debug, Clone, Copy)]
pub struct StructuredCall<'a> {
    /// Endpoint root, e.g. `DEFAULT_API_BASE`.
    pub api_base: &'a str,
    pub model: &'a str,
    pub api_key: &'a str,
    pub system_instruction: &'a str,
    pub task_prompt: &'a str,
    pub schema: &'a SchemaDescriptor,
}

/// `generateStructured(model, systemInstruction, taskPrompt, schema)`.
///
/// Returns the raw JSON text the model produced. An empty string is a
/// legal return; the gateway classifies it.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn generate_structured(&self, call: StructuredCall<'_>) -> Result<String, GenerationError>;
}

/// Selectable model, shown by `newsdesk models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub label: String,
}

/// All models the generator is known to work with.
pub fn all_models() -> Vec<ModelInfo> {
    [
        (DEFAULT_MODEL, "Gemini Flash (latest alias)"),
        ("gemini-3-flash-preview", "Gemini 3 Flash Preview: balanced speed and scale"),
        ("gemini-3-pro-preview", "Gemini 3 Pro Preview: most capable"),
        ("gemini-2.5-flash", "Gemini 2.5 Flash: stable, price-performance"),
        ("gemini-2.5-flash-lite", "Gemini 2.5 Flash-Lite: fastest, lowest cost"),
        ("gemini-2.5-pro", "Gemini 2.5 Pro: advanced reasoning"),
    ]
    .into_iter()
    .map(|(id, label)| ModelInfo {
        id: id.to_string(),
        label: label.to_string(),
    })
    .collect()
}

/// True when `model` is in the catalogue. Unknown ids are still allowed
/// through (new releases), this only drives a warning.
pub fn is_known_model(model: &str) -> bool {
    all_models().iter().any(|m| m.id == model)
}
