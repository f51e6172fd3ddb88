//! Conversation memory
//!
//! Bounded append-only log of (prompt, response, model) keyed by session.
//! Each session keeps at most [`SESSION_CAPACITY`] entries in insertion
//! order; the oldest entry is dropped on overflow. Reads return copies - the
//! ring itself is owned exclusively by this component.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::router::ModelKind;
use crate::store::Store;

/// Maximum entries retained per session
pub const SESSION_CAPACITY: usize = 50;

/// One completed exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub timestamp_ms: u64,
    pub session_id: String,
    pub prompt: String,
    pub response: String,
    pub model: ModelKind,
}

/// Bounded per-session conversation log
pub struct ConversationMemory {
    store: Arc<Store>,
}

impl ConversationMemory {
    /// Create a memory over the given store
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Append an entry to its session ring, dropping the oldest on overflow
    pub async fn append(&self, entry: ConversationEntry) {
        self.store
            .update(|data| {
                let ring = data
                    .conversations
                    .entry(entry.session_id.clone())
                    .or_default();
                ring.push_back(entry);
                while ring.len() > SESSION_CAPACITY {
                    ring.pop_front();
                }
            })
            .await;
    }

    /// Most recent `limit` entries for a session, in insertion order
    pub async fn recent(&self, session_id: &str, limit: usize) -> Vec<ConversationEntry> {
        self.store
            .read(|data| {
                data.conversations
                    .get(session_id)
                    .map(|ring| ring.iter().rev().take(limit).rev().cloned().collect())
                    .unwrap_or_default()
            })
            .await
    }

    /// Number of entries currently held for a session
    pub async fn len(&self, session_id: &str) -> usize {
        self.store
            .read(|data| {
                data.conversations
                    .get(session_id)
                    .map(|ring| ring.len())
                    .unwrap_or(0)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::now_ms;

    fn entry(session: &str, prompt: &str) -> ConversationEntry {
        ConversationEntry {
            timestamp_ms: now_ms(),
            session_id: session.to_string(),
            prompt: prompt.to_string(),
            response: format!("answer to {prompt}"),
            model: ModelKind::Analytical,
        }
    }

    fn memory() -> ConversationMemory {
        ConversationMemory::new(Arc::new(Store::in_memory()))
    }

    #[tokio::test]
    async fn test_append_and_recent_preserve_order() {
        let memory = memory();
        for i in 0..5 {
            memory.append(entry("s1", &format!("q{i}"))).await;
        }
        let recent = memory.recent("s1", 3).await;
        let prompts: Vec<&str> = recent.iter().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["q2", "q3", "q4"]);
    }

    #[tokio::test]
    async fn test_capacity_drops_oldest() {
        let memory = memory();
        for i in 0..(SESSION_CAPACITY + 10) {
            memory.append(entry("s1", &format!("q{i}"))).await;
        }
        assert_eq!(memory.len("s1").await, SESSION_CAPACITY);

        let all = memory.recent("s1", SESSION_CAPACITY).await;
        assert_eq!(all.first().map(|e| e.prompt.as_str()), Some("q10"));
        assert_eq!(
            all.last().map(|e| e.prompt.as_str()),
            Some(format!("q{}", SESSION_CAPACITY + 9).as_str())
        );
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let memory = memory();
        memory.append(entry("s1", "from one")).await;
        memory.append(entry("s2", "from two")).await;

        assert_eq!(memory.len("s1").await, 1);
        assert_eq!(memory.len("s2").await, 1);
        assert_eq!(memory.recent("unknown", 10).await.len(), 0);
    }
}
