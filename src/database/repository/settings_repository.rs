//! Per-chat settings repository.
//!
//! Flags are read on every inbound group message that contains a link, so
//! they sit behind a cache and writes go through it.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::Store;

#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn Store>,
    flags: TypedCache<String, bool>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn Store>, cache: &CacheRegistry) -> Self {
        Self {
            store,
            flags: cache.get_or_create("chat_flags", CacheConfig::chat_flags()),
        }
    }

    /// Whether the anti-link policy is active for a chat. Absent means off.
    pub async fn antilink_enabled(&self, chat_id: &str) -> Result<bool> {
        self.flag(&antilink_key(chat_id)).await
    }

    pub async fn set_antilink(&self, chat_id: &str, enabled: bool) -> Result<()> {
        self.set_flag(antilink_key(chat_id), enabled).await
    }

    async fn flag(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        if let Some(value) = self.flags.get(&key) {
            return Ok(value);
        }

        let value = self
            .store
            .get_value(&key)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        debug!("Flag {} loaded: {}", key, value);
        self.flags.insert(key, value);
        Ok(value)
    }

    async fn set_flag(&self, key: String, value: bool) -> Result<()> {
        self.store.set_value(&key, Value::Bool(value)).await?;
        self.flags.insert(key, value);
        Ok(())
    }
}

fn antilink_key(chat_id: &str) -> String {
    format!("antilink_{}", chat_id)
}
