//! In-process storage backend.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::{HistoryEntry, Store};
use crate::config::HistoryRetention;

/// `Store` kept entirely in memory. Each chat's log is guarded by its
/// DashMap shard lock, so appends to one chat never interleave.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<DashMap<String, Value>>,
    history: Arc<DashMap<String, VecDeque<HistoryEntry>>>,
    retention: HistoryRetention,
}

impl MemoryStore {
    pub fn new(retention: HistoryRetention) -> Self {
        Self {
            retention,
            ..Default::default()
        }
    }

    /// Number of stored entries for a chat.
    #[cfg(test)]
    pub fn history_len(&self, chat_id: &str) -> usize {
        self.history.get(chat_id).map(|h| h.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        let mut log = self.history.entry(entry.chat_id.clone()).or_default();
        log.push_back(entry);

        if log.len() > self.retention.prune_above {
            let excess = log.len() - self.retention.keep;
            log.drain(..excess);
        }
        Ok(())
    }

    async fn recent_history(&self, chat_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .history
            .get(chat_id)
            .map(|log| {
                let skip = log.len().saturating_sub(limit);
                log.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default())
    }
}
