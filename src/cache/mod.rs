//! Result cache: content-addressed store of prior generation results.
//!
//! Keyed by a SHA-256 fingerprint of the compiled prompt, schema and model
//! id, so any change to the prompt or model changes the key. Entries expire
//! after `CACHE_TTL_DAYS`. Storage failures never surface: caching is an
//! optimization, so errors are logged and the call proceeds uncached.

mod clock;
mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{CacheError, CacheStorage, FileCacheStorage, MemoryCacheStorage};

use crate::llm::types::{CompiledPrompt, GenerationResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Retention window for cached results, in days.
pub const CACHE_TTL_DAYS: i64 = 7;

/// One stored result. Never mutated in place; `put` replaces it whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub fingerprint: String,
    pub payload: GenerationResult,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FingerprintInput<'a> {
    system_instruction: &'a str,
    task_prompt: &'a str,
    schema: serde_json::Value,
    model_id: &'a str,
}

/// Lowercase hex SHA-256 of the canonical JSON of
/// `{systemInstruction, taskPrompt, schema, modelId}`.
pub fn fingerprint(prompt: &CompiledPrompt, model_id: &str) -> String {
    let input = FingerprintInput {
        system_instruction: &prompt.system_instruction,
        task_prompt: &prompt.task_prompt,
        schema: prompt.schema.to_response_schema(),
        model_id,
    };
    // Field order is fixed by the struct, so the serialization is canonical.
    let canonical = serde_json::to_vec(&input).unwrap_or_default();
    format!("{:x}", Sha256::digest(&canonical))
}

/// TTL-enforcing front for a `CacheStorage`.
#[derive(Clone)]
pub struct ResultCache {
    storage: Arc<dyn CacheStorage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self {
            storage,
            clock: Arc::new(SystemClock),
            ttl: Duration::days(CACHE_TTL_DAYS),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_stale(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.created_at > self.ttl
    }

    /// Live payload for `fingerprint`, or `None` when absent, expired or
    /// unreadable. Expired and corrupt entries are deleted on the way out.
    pub async fn get(&self, fingerprint: &str) -> Option<GenerationResult> {
        match self.storage.get(fingerprint).await {
            Ok(Some(entry)) if self.is_stale(&entry) => {
                log::info!("[CACHE] Expired entry {}", short(fingerprint));
                self.remove_quietly(fingerprint).await;
                None
            }
            Ok(Some(entry)) => Some(entry.payload),
            Ok(None) => None,
            Err(CacheError::Corrupt(e)) => {
                log::warn!("[CACHE] Corrupt entry {}: {}, discarding", short(fingerprint), e);
                self.remove_quietly(fingerprint).await;
                None
            }
            Err(e) => {
                log::warn!("[CACHE] Read failed for {}: {}", short(fingerprint), e);
                None
            }
        }
    }

    /// Store `payload`, overwriting any previous entry. Last write wins.
    pub async fn put(&self, fingerprint: &str, payload: &GenerationResult) {
        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            payload: payload.clone(),
            created_at: self.clock.now(),
        };
        match self.storage.put(fingerprint, &entry).await {
            Ok(()) => log::debug!("[CACHE] Stored {}", short(fingerprint)),
            Err(e) => log::warn!("[CACHE] Write failed for {}: {}", short(fingerprint), e),
        }
    }

    /// Delete every expired or unreadable entry. Returns how many went.
    pub async fn purge_expired(&self) -> usize {
        let keys = match self.storage.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("[CACHE] Could not list entries: {}", e);
                return 0;
            }
        };
        let mut removed = 0;
        for key in keys {
            let stale = match self.storage.get(&key).await {
                Ok(Some(entry)) => self.is_stale(&entry),
                Ok(None) => false,
                Err(_) => true,
            };
            if stale {
                self.remove_quietly(&key).await;
                removed += 1;
            }
        }
        log::info!("[CACHE] Purged {} expired entries", removed);
        removed
    }

    /// Drop everything.
    pub async fn clear(&self) {
        if let Err(e) = self.storage.clear().await {
            log::warn!("[CACHE] Clear failed: {}", e);
        }
    }

    async fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.storage.remove(key).await {
            log::warn!("[CACHE] Remove failed for {}: {}", short(key), e);
        }
    }
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}
