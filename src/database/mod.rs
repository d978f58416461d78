//! Storage collaborator.
//!
//! The core only needs two things from storage: opaque keyed values
//! (per-chat flags) and a bounded per-chat conversation log. `Store`
//! captures that contract; MongoDB is the production backend and
//! `MemoryStore` serves tests and `STORAGE=memory` runs.

mod memory;
mod models;
mod mongo;
mod repository;

use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryStore;
pub use models::{HistoryEntry, Role};
pub use mongo::MongoStore;
pub use repository::{HistoryRepository, SettingsRepository};

/// Backend contract for keyed values and chat history.
///
/// Single-key writes must be atomic. History appends for one chat must not
/// lose entries under concurrent appends; no cross-key guarantees.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_value(&self, key: &str) -> anyhow::Result<Option<Value>>;

    async fn set_value(&self, key: &str, value: Value) -> anyhow::Result<()>;

    /// Append an entry, pruning the chat to its retention window.
    async fn append_history(&self, entry: HistoryEntry) -> anyhow::Result<()>;

    /// The newest `limit` entries of a chat, oldest first.
    async fn recent_history(&self, chat_id: &str, limit: usize) -> anyhow::Result<Vec<HistoryEntry>>;
}
