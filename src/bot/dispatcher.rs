//! Shared application state.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::database::{HistoryRepository, SettingsRepository, Store};
use crate::permissions::Permissions;
use crate::plugins::PluginRegistry;
use crate::services::Services;
use crate::transport::Transport;

/// Shared application state, cloned into every dispatch task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Transport bridge to WhatsApp.
    pub transport: Arc<dyn Transport>,

    /// Remote AI and media services.
    pub services: Arc<dyn Services>,

    /// Cache registry for creating/accessing caches.
    pub cache: Arc<CacheRegistry>,

    /// Permission checker with group metadata caching.
    pub permissions: Arc<Permissions>,

    pub history: HistoryRepository,
    pub settings: SettingsRepository,

    /// Command table, rebuilt on reload.
    pub plugins: Arc<PluginRegistry>,

    pub shutdown: ShutdownHandle,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the collaborators together. The plugin registry starts empty;
    /// call `plugins.load()` before serving.
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
        services: Arc<dyn Services>,
    ) -> Self {
        let cache = Arc::new(CacheRegistry::new());
        let permissions = Arc::new(Permissions::new(transport.clone(), &cache, &config));
        let history = HistoryRepository::new(store.clone());
        let settings = SettingsRepository::new(store, &cache);
        let plugins = Arc::new(PluginRegistry::new(config.plugin_dir.clone()));

        Self {
            config: Arc::new(config),
            transport,
            services,
            cache,
            permissions,
            history,
            settings,
            plugins,
            shutdown: ShutdownHandle::new(),
            started_at: Instant::now(),
        }
    }
}

/// Process-wide stop signal shared by the server and the owner tools.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `trigger` has been called.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}
