//! Credential and model resolution.
//!
//! The gateway never reads ambient state; callers build a `GatewayConfig`
//! here (or by hand) and pass it into every call.
//!
//! Key lookup order: `GEMINI_API_KEY` env var, then the OS keychain
//! (service `newsdesk`, user `gemini`).

use crate::llm::gemini::DEFAULT_API_BASE;
use crate::llm::provider::{self, DEFAULT_MODEL};
use thiserror::Error;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

const KEYRING_SERVICE: &str = "newsdesk";
const KEYRING_USER: &str = "gemini";

/// Value shipped in sample env files; never a real key.
pub const PLACEHOLDER_KEY: &str = "YOUR_API_KEY_HERE";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key is empty")]
    EmptyKey,
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Explicit per-call configuration for the generation gateway. Every field
/// travels with the call: the gateway hands `api_base`, `model` and the key
/// to the endpoint in each `StructuredCall`.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

impl GatewayConfig {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// The key, if one is set and is not blank or the placeholder.
    pub fn usable_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| is_usable(k))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(None, DEFAULT_MODEL)
    }
}

// Hand-written so the key never reaches a log line via `{:?}`.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|k| format!("<{} chars>", k.len())))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn is_usable(key: &str) -> bool {
    !key.is_empty() && key != PLACEHOLDER_KEY
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build a `GatewayConfig` from the environment and the OS keychain.
///
/// A missing key is not an error here; the gateway reports
/// `MissingCredential` when a call is attempted.
pub fn resolve() -> GatewayConfig {
    let model = env_value(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string());
    if !provider::is_known_model(&model) {
        log::warn!("[CREDENTIALS] Model '{}' is not in the catalogue, using it anyway", model);
    }
    let api_base = env_value(API_BASE_ENV).unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let api_key = match env_value(API_KEY_ENV).filter(|k| is_usable(k)) {
        Some(key) => {
            log::info!("[CREDENTIALS] Using {} ({} chars)", API_KEY_ENV, key.len());
            Some(key)
        }
        None => keychain_key(),
    };
    if api_key.is_none() {
        log::warn!("[CREDENTIALS] No API key found in env or keychain");
    }

    GatewayConfig {
        api_key,
        model,
        api_base,
    }
}

fn keychain_key() -> Option<String> {
    let entry = match keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        Ok(entry) => entry,
        Err(e) => {
            log::debug!("[CREDENTIALS] Keychain unavailable: {}", e);
            return None;
        }
    };
    match entry.get_password() {
        Ok(key) if is_usable(key.trim()) => {
            log::info!("[CREDENTIALS] Loaded key from OS keychain");
            Some(key.trim().to_string())
        }
        Ok(_) => None,
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::warn!("[CREDENTIALS] Keychain read failed: {}", e);
            None
        }
    }
}

/// Store `api_key` in the OS keychain.
pub fn save_api_key(api_key: &str) -> Result<(), CredentialError> {
    let key = api_key.trim();
    if !is_usable(key) {
        return Err(CredentialError::EmptyKey);
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    entry.set_password(key)?;
    log::info!("[CREDENTIALS] API key saved to OS keychain ({} chars)", key.len());
    Ok(())
}
