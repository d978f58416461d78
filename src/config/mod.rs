//! Configuration module for the Alicia bot.
//!
//! Loads configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use url::Url;

use crate::utils::retry::RetryPolicy;

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    MongoDb { uri: String, database: String },
    Memory,
}

/// Humanization settings applied before a command handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiBan {
    /// Send a "composing" presence and sleep before replying.
    pub typing: bool,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl AntiBan {
    /// Build the window, swapping the bounds if they were given inverted.
    pub fn new(typing: bool, min_delay: Duration, max_delay: Duration) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };
        Self {
            typing,
            min_delay,
            max_delay,
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO, Duration::ZERO)
    }
}

/// Chat history retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRetention {
    /// Prune once a chat holds more than this many entries.
    pub prune_above: usize,
    /// Entries kept after pruning (newest first).
    pub keep: usize,
}

impl Default for HistoryRetention {
    fn default() -> Self {
        Self {
            prune_above: 50,
            keep: 40,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Identity
    pub bot_name: String,
    pub owner_name: String,
    /// Owner phone number, digits only.
    pub owner_number: String,
    /// Owner linked-device identity (`...@lid`).
    pub owner_lid: Option<String>,
    pub footer: String,
    pub locale: String,

    // Collaborators
    pub api_base_url: Url,
    pub upload_url: Url,
    pub bridge_url: Url,
    pub bridge_token: Option<String>,
    pub listen_addr: SocketAddr,
    pub storage: StorageBackend,

    // Behaviour
    pub auto_read: bool,
    pub auto_upload_images: bool,
    pub anti_ban: AntiBan,
    pub plugin_dir: PathBuf,
    pub history: HistoryRetention,

    /// Retry policy wrapped around each plugin invocation.
    pub plugin_retry: RetryPolicy,
    /// Retry policy for outbound calls to remote services.
    pub api_retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let owner_number: String = env::var("OWNER_NUMBER")
            .context("OWNER_NUMBER must be set")?
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if owner_number.is_empty() {
            bail!("OWNER_NUMBER must contain digits");
        }

        let storage = match var_or("STORAGE", "mongodb").to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "mongodb" | "mongo" => StorageBackend::MongoDb {
                uri: env::var("MONGODB_URI").context("MONGODB_URI must be set")?,
                database: var_or("MONGODB_DATABASE", "alicia"),
            },
            other => bail!("Unknown STORAGE backend: {}", other),
        };

        let anti_ban = AntiBan::new(
            parse_or("ANTI_BAN_TYPING", true)?,
            Duration::from_millis(parse_or("ANTI_BAN_MIN_DELAY_MS", 1000)?),
            Duration::from_millis(parse_or("ANTI_BAN_MAX_DELAY_MS", 3000)?),
        );

        let history = HistoryRetention {
            prune_above: parse_or("HISTORY_PRUNE_ABOVE", 50)?,
            keep: parse_or("HISTORY_KEEP", 40)?,
        };
        if history.keep > history.prune_above {
            bail!("HISTORY_KEEP must not exceed HISTORY_PRUNE_ABOVE");
        }

        Ok(Self {
            bot_name: var_or("BOT_NAME", "Alicia BOT"),
            owner_name: var_or("OWNER_NAME", "Owner"),
            owner_number,
            owner_lid: env::var("OWNER_LID").ok().filter(|s| !s.trim().is_empty()),
            footer: var_or("FOOTER", "© NextA Project 2025"),
            locale: var_or("LOCALE", "id"),
            api_base_url: parse_url(&env::var("API_BASE_URL").context("API_BASE_URL must be set")?)?,
            upload_url: parse_url(&var_or("UPLOAD_URL", "https://puruh2o-backend.hf.space"))?,
            bridge_url: parse_url(&env::var("BRIDGE_URL").context("BRIDGE_URL must be set")?)?,
            bridge_token: env::var("BRIDGE_TOKEN").ok().filter(|s| !s.is_empty()),
            listen_addr: parse_or("LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            storage,
            auto_read: parse_or("AUTO_READ", true)?,
            auto_upload_images: parse_or("AUTO_UPLOAD_IMAGES", true)?,
            anti_ban,
            plugin_dir: PathBuf::from(var_or("PLUGIN_DIR", "plugins")),
            history,
            plugin_retry: RetryPolicy::new(3, Duration::from_millis(1000)),
            api_retry: RetryPolicy::new(3, Duration::from_millis(2000)),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        _ => Ok(default),
    }
}

/// Parse a base URL, making sure it ends in `/` so `join` keeps its path.
pub fn parse_url(raw: &str) -> anyhow::Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).with_context(|| format!("Invalid URL: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anti_ban_swaps_inverted_window() {
        let anti_ban = AntiBan::new(true, Duration::from_millis(3000), Duration::from_millis(1000));
        assert_eq!(anti_ban.min_delay, Duration::from_millis(1000));
        assert_eq!(anti_ban.max_delay, Duration::from_millis(3000));
    }

    #[test]
    fn test_parse_url_appends_slash() {
        let url = parse_url("https://api.example.com/v1").unwrap();
        assert_eq!(url.join("api/ai/grok").unwrap().as_str(), "https://api.example.com/v1/api/ai/grok");
    }

    #[test]
    fn test_default_retention() {
        let retention = HistoryRetention::default();
        assert_eq!(retention.prune_above, 50);
        assert_eq!(retention.keep, 40);
    }
}
