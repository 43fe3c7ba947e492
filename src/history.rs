//! Generation history: the 50 most recent bundles, newest first.
//!
//! Default location: `~/.local/share/newsdesk/history.json` (macOS:
//! `~/Library/Application Support/newsdesk/history.json`).

use crate::config::EditorialSettings;
use crate::llm::types::GenerationResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A finished generation, ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDraft {
    pub source_text: String,
    pub context: Option<String>,
    pub settings: EditorialSettings,
    pub output: GenerationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source_text: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: EditorialSettings,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: GenerationResult,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl HistoryRecord {
    fn from_draft(draft: NewDraft) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source_text: draft.source_text,
            context: draft.context,
            settings: draft.settings,
            output: draft.output,
        }
    }
}

/// Every mutating call returns the updated list.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, draft: NewDraft) -> Result<Vec<HistoryRecord>, HistoryError>;
    async fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError>;
    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError>;
    async fn delete(&self, id: &str) -> Result<Vec<HistoryRecord>, HistoryError>;
    async fn clear(&self) -> Result<Vec<HistoryRecord>, HistoryError>;
}

fn push_front(mut records: Vec<HistoryRecord>, record: HistoryRecord) -> Vec<HistoryRecord> {
    records.insert(0, record);
    records.truncate(MAX_HISTORY);
    records
}

// ── In-memory ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn save(&self, draft: NewDraft) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut records = self.records.lock().await;
        *records = push_front(std::mem::take(&mut *records), HistoryRecord::from_draft(draft));
        Ok(records.clone())
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self.records.lock().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        Ok(self.records.lock().await.iter().find(|r| r.id == id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut records = self.records.lock().await;
        records.retain(|r| r.id != id);
        Ok(records.clone())
    }

    async fn clear(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        self.records.lock().await.clear();
        Ok(Vec::new())
    }
}

// ── JSON file ──────────────────────────────────────────────────────

/// The whole list in one JSON array. Reads are forgiving: a missing file is
/// an empty history and records that fail to decode are skipped. Before a
/// write replaces a file that did not fully decode, the old file is moved
/// aside to `history.json.corrupt-<timestamp>`.
#[derive(Debug)]
pub struct JsonHistoryStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

/// Decoded file contents. `damaged` is set when anything on disk could
/// not be read back.
#[derive(Debug, Default)]
struct Loaded {
    records: Vec<HistoryRecord>,
    damaged: bool,
}

fn decode_records(raw: &str, path: &Path) -> Loaded {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            log::warn!("[HISTORY] Ignoring unreadable {}: {}", path.display(), e);
            return Loaded {
                records: Vec::new(),
                damaged: true,
            };
        }
    };
    let mut loaded = Loaded::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<HistoryRecord>(value) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                log::warn!("[HISTORY] Skipping record {} in {}: {}", index, path.display(), e);
                loaded.damaged = true;
            }
        }
    }
    loaded
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn default_location() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("newsdesk")
            .join("history.json");
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Loaded {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => decode_records(&raw, &self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Loaded::default(),
            Err(e) => {
                log::warn!("[HISTORY] Failed to read {}: {}", self.path.display(), e);
                Loaded {
                    records: Vec::new(),
                    damaged: true,
                }
            }
        }
    }

    /// Load for a read-modify-write cycle, moving a damaged file aside
    /// first so the rewrite cannot lose what was skipped.
    async fn load_for_write(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let loaded = self.load().await;
        if loaded.damaged {
            let aside = self.path.with_extension(format!(
                "json.corrupt-{}",
                Utc::now().format("%Y%m%d%H%M%S%3f")
            ));
            tokio::fs::rename(&self.path, &aside).await?;
            log::warn!(
                "[HISTORY] Moved damaged {} to {}",
                self.path.display(),
                aside.display()
            );
        }
        Ok(loaded.records)
    }

    async fn store(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn save(&self, draft: NewDraft) -> Result<Vec<HistoryRecord>, HistoryError> {
        let _guard = self.lock.lock().await;
        let record = HistoryRecord::from_draft(draft);
        log::info!("[HISTORY] Saving {}", record.id);
        let records = push_front(self.load_for_write().await?, record);
        self.store(&records).await?;
        Ok(records)
    }

    async fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await.records)
    }

    async fn get(&self, id: &str) -> Result<Option<HistoryRecord>, HistoryError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await.records.into_iter().find(|r| r.id == id))
    }

    async fn delete(&self, id: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load_for_write().await?;
        records.retain(|r| r.id != id);
        self.store(&records).await?;
        log::info!("[HISTORY] Deleted {}", id);
        Ok(records)
    }

    async fn clear(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        log::info!("[HISTORY] Cleared");
        Ok(Vec::new())
    }
}
