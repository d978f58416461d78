//! Alicia - Plugin-driven WhatsApp chat bot
//!
//! Receives WhatsApp events from a transport bridge, runs them through a
//! dispatch pipeline and answers through plugins and an AI responder.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Storage (MongoDB or in-memory) and repositories
//! - `cache` - TTL/LRU caching with Moka
//! - `transport` - WhatsApp bridge client and outbound message model
//! - `message` - Inbound message model and normalization
//! - `permissions` - Group role checks with cached metadata
//! - `bot` - Application state, dispatch pipeline, webhook runtime
//! - `plugins` - Command handlers, manifests and the hot-reloadable registry
//! - `events` - Anti-link guard and static commands
//! - `ai` - Prompting, trigger-tag parsing and AI side effects
//! - `services` - Remote AI and media APIs
//! - `utils` - Command parser, retry policy, helpers

mod ai;
mod bot;
mod cache;
mod config;
mod database;
mod events;
mod i18n;
mod message;
mod permissions;
mod plugins;
mod services;
mod transport;
mod utils;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::AppState;
use config::{Config, StorageBackend};
use database::{MemoryStore, MongoStore, Store};
use services::ApiClient;
use transport::BridgeTransport;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("alicia=info,tower_http=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Alicia bot...");
    i18n::init();

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    let store: Arc<dyn Store> = match &config.storage {
        StorageBackend::MongoDb { uri, database } => {
            info!("Connecting to MongoDB...");
            Arc::new(MongoStore::connect(uri, database, config.history).await?)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Arc::new(MemoryStore::new(config.history))
        }
    };

    let transport =
        BridgeTransport::connect(config.bridge_url.clone(), config.bridge_token.clone()).await?;

    let services = ApiClient::new(
        config.api_base_url.clone(),
        config.upload_url.clone(),
        config.api_retry,
    )?;

    let state = AppState::new(config, store, Arc::new(transport), Arc::new(services));
    state.plugins.load()?;

    bot::run(state).await
}
