//! Chat history entry model.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Bot replies and action results.
    #[serde(alias = "ai")]
    Assistant,
    /// Bookkeeping such as "Executed: ping"; never fed back into prompts.
    System,
}

/// One line of a chat's conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,

    pub chat_id: String,
    pub role: Role,
    pub message: String,

    #[serde(default)]
    pub sender_name: String,

    /// Unix milliseconds.
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(
        chat_id: impl Into<String>,
        role: Role,
        message: impl Into<String>,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            chat_id: chat_id.into(),
            role,
            message: message.into(),
            sender_name: sender_name.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
