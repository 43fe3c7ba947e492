//! Cache storage backends.
//!
//! `get`/`put`/`remove` by key, with entries carrying their own creation
//! timestamp so expiry is enforced by `ResultCache`, not the backend.

use super::CacheEntry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("cache quota exceeded")]
    QuotaExceeded,
    #[error("invalid cache key '{0}'")]
    InvalidKey(String),
}

#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError>;
    async fn remove(&self, key: &str) -> Result<(), CacheError>;
    async fn keys(&self) -> Result<Vec<String>, CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}

// ── In-memory ──────────────────────────────────────────────────────

/// Process-local storage. An optional entry cap stands in for a storage
/// quota: inserting a new key past the cap fails with `QuotaExceeded`.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: Option<usize>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        if let Some(cap) = self.capacity {
            if !entries.contains_key(key) && entries.len() >= cap {
                return Err(CacheError::QuotaExceeded);
            }
        }
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

// ── On-disk ────────────────────────────────────────────────────────

/// One `<fingerprint>.json` file per entry.
///
/// Default location: `~/.cache/newsdesk/results` (macOS:
/// `~/Library/Caches/newsdesk/results`).
#[derive(Debug, Clone)]
pub struct FileCacheStorage {
    dir: PathBuf,
}

impl FileCacheStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the platform cache directory.
    pub fn default_location() -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsdesk")
            .join("results");
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are hex fingerprints; anything else could escape the directory.
    fn entry_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl CacheStorage for FileCacheStorage {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec(entry)?;
        // Write-then-rename so readers never see a half-written entry.
        let tmp = self.dir.join(format!("{}.json.{}.tmp", key, uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            if let Some(key) = name.to_str().and_then(|n| n.strip_suffix(".json")) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        for key in self.keys().await? {
            self.remove(&key).await?;
        }
        Ok(())
    }
}
