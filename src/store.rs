//! Local persistent store
//!
//! Installation identity, usage counters, conversation rings, and the
//! bounded diagnostic logs persist as self-describing JSON records in a
//! single file. Writes go through one async mutex, so every read-modify-write
//! against the store is serialized; persistence is write-temp-then-rename.
//!
//! Store I/O failures are counted and logged but never propagate into the
//! query path: losing a diagnostic record is preferable to failing a query.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::memory::ConversationEntry;
use crate::router::ModelKind;

/// Error log retains at most this many entries
pub const ERROR_LOG_CAPACITY: usize = 100;
/// Routing-decision log retains at most this many entries
pub const DECISION_LOG_CAPACITY: usize = 1000;

/// Store I/O failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One entry in the bounded error log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp_ms: u64,
    pub provider: String,
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub attempt: usize,
}

/// One entry in the bounded routing-decision log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub timestamp_ms: u64,
    pub query_preview: String,
    pub target: ModelKind,
    pub use_webpage_context: bool,
    pub reasoning: String,
}

/// Everything the store persists
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreData {
    /// Opaque installation identity, generated on first use
    pub installation_id: String,
    /// Usage counters keyed by installation id
    pub usage: HashMap<String, u32>,
    /// Conversation rings keyed by session id
    pub conversations: HashMap<String, VecDeque<ConversationEntry>>,
    /// Bounded error log, newest last
    pub error_log: VecDeque<ErrorLogEntry>,
    /// Bounded routing-decision log, newest last
    pub decision_log: VecDeque<DecisionLogEntry>,
}

/// File-backed key-value store with serialized mutation
pub struct Store {
    path: Option<PathBuf>,
    state: Mutex<StoreData>,
    write_failures: AtomicU64,
}

impl Store {
    /// Open (or create) the store file at `path`
    ///
    /// A missing file yields default data; a corrupt file is an error rather
    /// than a silent reset, so an operator can decide what to do with it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut data = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            StoreData::default()
        };
        ensure_installation_id(&mut data);

        Ok(Self {
            path: Some(path),
            state: Mutex::new(data),
            write_failures: AtomicU64::new(0),
        })
    }

    /// Create a store that never touches disk
    ///
    /// Used by tests and by callers that want metering without persistence.
    pub fn in_memory() -> Self {
        let mut data = StoreData::default();
        ensure_installation_id(&mut data);
        Self {
            path: None,
            state: Mutex::new(data),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Read a snapshot of part of the store
    pub async fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> R {
        let guard = self.state.lock().await;
        f(&guard)
    }

    /// Mutate the store and persist before releasing the lock
    ///
    /// The mutex is held through the persist, so concurrent updates are
    /// strictly serialized: each sees the previous update fully applied.
    /// Persistence failures are counted and logged, not propagated.
    pub async fn update<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> R {
        let mut guard = self.state.lock().await;
        let result = f(&mut guard);
        if let Err(e) = self.persist(&guard) {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "Store persist failed, state kept in memory");
        }
        result
    }

    /// Opaque installation identity
    pub async fn installation_id(&self) -> String {
        self.read(|data| data.installation_id.clone()).await
    }

    /// Number of failed persist attempts since startup
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Append to the bounded error log (best-effort)
    pub async fn log_error(&self, entry: ErrorLogEntry) {
        self.update(|data| {
            data.error_log.push_back(entry);
            while data.error_log.len() > ERROR_LOG_CAPACITY {
                data.error_log.pop_front();
            }
        })
        .await;
    }

    /// Append to the bounded routing-decision log (best-effort)
    pub async fn log_decision(&self, entry: DecisionLogEntry) {
        self.update(|data| {
            data.decision_log.push_back(entry);
            while data.decision_log.len() > DECISION_LOG_CAPACITY {
                data.decision_log.pop_front();
            }
        })
        .await;
    }

    /// Most recent error log entries, newest last
    pub async fn recent_errors(&self, limit: usize) -> Vec<ErrorLogEntry> {
        self.read(|data| {
            data.error_log
                .iter()
                .rev()
                .take(limit)
                .rev()
                .cloned()
                .collect()
        })
        .await
    }

    fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn ensure_installation_id(data: &mut StoreData) {
    if data.installation_id.is_empty() {
        data.installation_id = Uuid::new_v4().to_string();
    }
}

/// Milliseconds since the Unix epoch
///
/// A clock before the epoch yields 0 rather than panicking.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
