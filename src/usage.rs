//! Usage metering
//!
//! Per-installation query counter with a fixed quota. Increments are
//! strictly serialized: every increment runs its read-modify-write-persist
//! inside the store's mutex, so no two increments can observe the same
//! pre-increment value. Each successful increment broadcasts the new record
//! to all interested listeners; delivery is best-effort.
//!
//! The meter itself never blocks anything. Whether an exceeded quota stops
//! query submission is the caller's policy, checked before invoking the
//! routing/execution pipeline.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::store::Store;

/// Broadcast channel capacity for usage updates
const UPDATE_CHANNEL_CAPACITY: usize = 32;

/// Snapshot of usage against the quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub current_usage: u32,
    pub remaining: u32,
    pub exceeded: bool,
}

impl UsageRecord {
    fn from_count(current_usage: u32, quota: u32) -> Self {
        Self {
            current_usage,
            remaining: quota.saturating_sub(current_usage),
            exceeded: current_usage >= quota,
        }
    }
}

/// Per-installation usage meter
pub struct UsageMeter {
    store: Arc<Store>,
    quota: u32,
    updates: broadcast::Sender<UsageRecord>,
}

impl UsageMeter {
    /// Create a meter over the given store and quota
    pub fn new(store: Arc<Store>, quota: u32) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            store,
            quota,
            updates,
        }
    }

    /// The fixed quota
    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Read the current record without mutating anything
    pub async fn check(&self) -> UsageRecord {
        self.store
            .read(|data| {
                let count = data.usage.get(&data.installation_id).copied().unwrap_or(0);
                UsageRecord::from_count(count, self.quota)
            })
            .await
    }

    /// Atomically add one to the counter and persist
    ///
    /// Serialized through the store mutex; each call sees the previous call
    /// fully persisted before computing its own read-modify-write.
    pub async fn increment(&self) -> UsageRecord {
        let record = self
            .store
            .update(|data| {
                let count = data.usage.entry(data.installation_id.clone()).or_insert(0);
                *count += 1;
                UsageRecord::from_count(*count, self.quota)
            })
            .await;

        // Best-effort broadcast; a send with no receivers is not a failure
        let _ = self.updates.send(record);

        tracing::debug!(
            current_usage = record.current_usage,
            remaining = record.remaining,
            exceeded = record.exceeded,
            "Usage incremented"
        );
        record
    }

    /// Reset the counter to zero
    pub async fn reset(&self) -> UsageRecord {
        let record = self
            .store
            .update(|data| {
                data.usage.insert(data.installation_id.clone(), 0);
                UsageRecord::from_count(0, self.quota)
            })
            .await;

        let _ = self.updates.send(record);
        tracing::info!("Usage counter reset");
        record
    }

    /// Subscribe to usage updates
    pub fn subscribe(&self) -> broadcast::Receiver<UsageRecord> {
        self.updates.subscribe()
    }
}
