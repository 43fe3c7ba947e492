//! Scripted model endpoint shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use newsdesk_lib::llm::provider::{ModelEndpoint, StructuredCall};
use newsdesk_lib::llm::GenerationError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the gateway sent for one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_base: String,
    pub model: String,
    pub api_key: String,
    pub system_instruction: String,
    pub task_prompt: String,
    pub schema: &'static str,
}

/// Replies with queued responses in order and records every call.
/// Running out of script is a transport error.
#[derive(Default)]
pub struct ScriptedEndpoint {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, json: &str) -> Self {
        self.push(Ok(json.to_string()));
        self
    }

    pub fn fail(self, error: GenerationError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn push(&self, reply: Result<String, GenerationError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls.lock().unwrap().last().cloned().expect("no calls recorded")
    }
}

#[async_trait]
impl ModelEndpoint for ScriptedEndpoint {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_structured(&self, call: StructuredCall<'_>) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(RecordedCall {
            api_base: call.api_base.to_string(),
            model: call.model.to_string(),
            api_key: call.api_key.to_string(),
            system_instruction: call.system_instruction.to_string(),
            task_prompt: call.task_prompt.to_string(),
            schema: call.schema.name,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
    }
}

pub const FULL_REPLY: &str = r###"{
    "titles": ["A", "B", "C"],
    "hashtags": ["#CityCouncil", "ParkBudget", "#LocalNews", "#Budget2026", "#Parks"],
    "article": "CITY HALL, 2026-01-21 - The city council approved a new park budget of $2M on Tuesday.\n\nThe vote followed a public hearing."
}"###;
