//! Chat history repository.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::database::{HistoryEntry, Role, Store};

/// Conversation log access. Not cached: entries are append-only and the
/// prompt builder always wants the freshest tail.
#[derive(Clone)]
pub struct HistoryRepository {
    store: Arc<dyn Store>,
}

impl HistoryRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one entry to a chat's log.
    pub async fn add(&self, chat_id: &str, role: Role, message: &str, sender_name: &str) -> Result<()> {
        self.store
            .append_history(HistoryEntry::new(chat_id, role, message, sender_name))
            .await?;
        debug!("History += {:?} for {}", role, chat_id);
        Ok(())
    }

    /// The newest `limit` entries, oldest first.
    pub async fn recent(&self, chat_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.store.recent_history(chat_id, limit).await
    }
}
