//! LLM domain: prompt compilation and schema-constrained generation.
//!
//! Public API for the generation core. External code should only use the
//! items exported here and the submodules marked `pub`.
//!
//! Pipeline:
//!   - compile.rs        GenerationRequest -> CompiledPrompt (pure)
//!   - gateway.rs        credential check, cache, endpoint call, validation
//!   - gemini.rs         Gemini `generateContent` endpoint
//!
//! Shared:
//!   - schema.rs         response shape per operation kind
//!   - prompts.rs        persona + editorial system instruction
//!   - prompts_task.rs   per-operation task prompts
//!   - hashtags.rs       tag coercion and article body hygiene
//!   - provider.rs       endpoint trait + model catalogue

pub mod compile;
pub mod error;
pub mod gateway;
pub mod gemini;
pub mod hashtags;
pub mod prompts;
pub mod prompts_task;
pub mod provider;
pub mod schema;
pub mod types;

pub use compile::compile;
pub use error::GenerationError;
pub use gateway::Gateway;
pub use gemini::GeminiEndpoint;
pub use provider::{ModelEndpoint, StructuredCall};
pub use schema::SchemaDescriptor;
pub use types::{CompiledPrompt, GenerationRequest, GenerationResult, OperationKind};
