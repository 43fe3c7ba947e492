//! Newsdesk: newsroom generation core.
//!
//! Turns source material plus editorial settings into a bundle of headline
//! options, an article and hashtags through schema-constrained Gemini calls,
//! and regenerates parts of that bundle without disturbing the rest.
//!
//! Layers:
//!   - config        editorial settings registry (languages, angles, styles...)
//!   - llm           prompt compiler, response schemas, gateway, Gemini endpoint
//!   - cache         content-addressed result cache with TTL
//!   - coordinator   partial regeneration and positional title merge
//!   - session       per-session state machine with stale-result discard
//!   - history       recent-bundle store
//!   - credentials   API key and model resolution
//!
//! The `newsdesk` binary is a thin command-line driver over this library.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod history;
pub mod llm;
pub mod session;

pub use config::EditorialSettings;
pub use coordinator::{ArticleRewrite, Coordinator, SourceMaterial};
pub use credentials::GatewayConfig;
pub use llm::{GenerationError, GenerationResult};
