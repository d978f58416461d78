//! MongoDB storage backend.

use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions, ReplaceOptions};
use mongodb::{Client, Collection, IndexModel};
use serde_json::Value;
use tracing::{debug, info};

use super::{HistoryEntry, Store};
use crate::config::HistoryRetention;

/// MongoDB-backed `Store`.
///
/// - `kv_store`: `{ _id: key, value }`
/// - `chat_history`: one document per `HistoryEntry`, indexed by chat and time
#[derive(Debug, Clone)]
pub struct MongoStore {
    kv: Collection<Document>,
    history: Collection<HistoryEntry>,
    retention: HistoryRetention,
}

impl MongoStore {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Errors
    /// Returns error if connection or index creation fails.
    pub async fn connect(uri: &str, db_name: &str, retention: HistoryRetention) -> Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        let db = client.database(db_name);
        let history: Collection<HistoryEntry> = db.collection("chat_history");

        let index = IndexModel::builder()
            .keys(doc! { "chat_id": 1, "timestamp": -1 })
            .options(IndexOptions::builder().name("chat_time".to_string()).build())
            .build();
        history.create_index(index).await?;

        Ok(Self {
            kv: db.collection("kv_store"),
            history,
            retention,
        })
    }

    async fn prune(&self, chat_id: &str) -> Result<()> {
        let count = self.history.count_documents(doc! { "chat_id": chat_id }).await?;
        if count <= self.retention.prune_above as u64 {
            return Ok(());
        }

        let raw: Collection<Document> = self.history.clone_with_type();
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .skip(self.retention.keep as u64)
            .projection(doc! { "_id": 1 })
            .build();

        let stale: Vec<bson::Bson> = raw
            .find(doc! { "chat_id": chat_id })
            .with_options(options)
            .await?
            .try_filter_map(|d| async move { Ok(d.get("_id").cloned()) })
            .try_collect()
            .await?;

        let result = raw.delete_many(doc! { "_id": { "$in": stale } }).await?;
        debug!("Pruned {} history entries for {}", result.deleted_count, chat_id);
        Ok(())
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let found = self.kv.find_one(doc! { "_id": key }).await?;
        Ok(found
            .and_then(|d| d.get("value").cloned())
            .map(bson::Bson::into_relaxed_extjson))
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        let value = bson::to_bson(&value)?;
        let options = ReplaceOptions::builder().upsert(true).build();

        self.kv
            .replace_one(doc! { "_id": key }, doc! { "_id": key, "value": value })
            .with_options(options)
            .await?;

        debug!("Saved key {}", key);
        Ok(())
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        let chat_id = entry.chat_id.clone();
        self.history.insert_one(entry).await?;
        self.prune(&chat_id).await
    }

    async fn recent_history(&self, chat_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let options = FindOptions::builder()
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .limit(limit as i64)
            .build();

        let mut entries: Vec<HistoryEntry> = self
            .history
            .find(doc! { "chat_id": chat_id })
            .with_options(options)
            .await?
            .try_collect()
            .await?;

        entries.reverse();
        Ok(entries)
    }
}
