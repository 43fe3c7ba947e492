//! Gemini `generateContent` endpoint.
//!
//! Key differences from a plain chat call:
//! - API key in the URL query param, not a header
//! - `responseMimeType: "application/json"` plus `responseSchema` constrain
//!   the output, so no code-fence stripping is normally needed
//! - Text arrives in `candidates[0].content.parts[*].text`
//! - Token usage in `usageMetadata`

use super::error::GenerationError;
use super::provider::{ModelEndpoint, StructuredCall};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Bytes of an error body kept in a `Transport` error.
const ERROR_BODY_SNIPPET: usize = 200;

/// Holds only the HTTP client; the API base, model and key come with
/// each call.
pub struct GeminiEndpoint {
    client: reqwest::Client,
}

impl GeminiEndpoint {
    pub fn new(timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { client })
    }
}

fn url(call: &StructuredCall<'_>) -> String {
    format!(
        "{}/models/{}:generateContent?key={}",
        call.api_base.trim_end_matches('/'),
        call.model,
        call.api_key
    )
}

#[async_trait]
impl ModelEndpoint for GeminiEndpoint {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_structured(&self, call: StructuredCall<'_>) -> Result<String, GenerationError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(url(&call))
            .header("content-type", "application/json")
            .json(&build_request_body(&call))
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                log::error!("[GEMINI] HTTP request failed: {}", e);
                GenerationError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            log::error!("[GEMINI] Failed to read response body: {}", e);
            GenerationError::Transport(e.to_string())
        })?;

        if !status.is_success() {
            let snippet = truncate_for_log(&body, ERROR_BODY_SNIPPET);
            log::error!("[GEMINI] API returned {}: {}", status, snippet);
            return Err(GenerationError::Transport(format!(
                "Gemini API returned {}: {}",
                status, snippet
            )));
        }

        log::info!(
            "[GEMINI] {} responded in {}ms ({} bytes)",
            call.model,
            start.elapsed().as_millis(),
            body.len()
        );

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            GenerationError::Transport(format!("Gemini returned a non-JSON envelope: {}", e))
        })?;
        log_usage(&parsed);
        Ok(extract_text(&parsed))
    }
}

/// Request body for `generateContent`.
pub fn build_request_body(call: &StructuredCall<'_>) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{ "text": call.task_prompt }]
            }
        ],
        "systemInstruction": {
            "parts": [{ "text": call.system_instruction }]
        },
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": call.schema.to_response_schema()
        }
    })
}

/// Concatenate every text part of the first candidate. Empty when the
/// model produced nothing (blocked prompt, no candidates, empty parts).
pub fn extract_text(envelope: &Value) -> String {
    if let Some(reason) = envelope
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(Value::as_str)
    {
        log::warn!("[GEMINI] Prompt blocked: {}", reason);
    }

    let candidate = match envelope.get("candidates").and_then(|c| c.get(0)) {
        Some(c) => c,
        None => return String::new(),
    };
    if let Some(reason) = candidate.get("finishReason").and_then(Value::as_str) {
        if reason != "STOP" {
            log::warn!("[GEMINI] Finish reason: {}", reason);
        }
    }
    candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn log_usage(envelope: &Value) {
    if let Some(usage) = envelope.get("usageMetadata") {
        let input = usage["promptTokenCount"].as_u64().unwrap_or(0);
        let output = usage["candidatesTokenCount"].as_u64().unwrap_or(0);
        log::info!("[GEMINI] Tokens: {} in / {} out", input, output);
    }
}

/// Cut `s` to at most `max` bytes on a char boundary.
fn truncate_for_log(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
