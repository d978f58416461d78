//! External AI and media services.
//!
//! Everything here is an opaque remote call; `Services` is the seam the
//! plugins and the AI action handlers talk to.

mod api;
mod stream;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub use api::ApiClient;

/// Errors raised by the remote services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid service url: {0}")]
    Url(#[from] url::ParseError),

    #[error("API error (HTTP {0})")]
    Status(u16),

    #[error("API returned unsuccessful response: {0}")]
    Unsuccessful(String),

    #[error("image generation signal [false] received")]
    StreamFailed,

    #[error("stream ended without URL")]
    StreamEnded,

    #[error("invalid result payload: {0}")]
    InvalidPayload(String),

    #[error("could not parse uploaded file URL")]
    UploadUnparsed,
}

/// A playable track.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub duration: Value,
}

impl Track {
    /// Duration as reported by the service (text or seconds).
    pub fn duration_label(&self) -> String {
        match &self.duration {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TikTokAuthor {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub unique_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TikTokMusic {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

/// Metadata and media links of a TikTok post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TikTokVideo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: TikTokAuthor,
    #[serde(default)]
    pub music_info: TikTokMusic,
    pub download_url: Option<String>,
    pub play_url: Option<String>,
    pub duration: Option<u64>,
    /// Unix seconds.
    pub create_time: Option<i64>,
}

impl TikTokVideo {
    /// Watermark-free link first, playback link as fallback.
    pub fn video_url(&self) -> Option<&str> {
        fn usable(url: &Option<String>) -> Option<&str> {
            url.as_deref().filter(|u| !u.is_empty())
        }
        usable(&self.download_url).or_else(|| usable(&self.play_url))
    }
}

/// Result of an image restyle.
#[derive(Debug, Clone, Deserialize)]
pub struct EditedImage {
    pub output: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Remote AI and media operations.
#[async_trait]
pub trait Services: Send + Sync {
    /// Free-form completion for a fully built prompt.
    async fn chat(&self, prompt: &str) -> anyhow::Result<String>;

    /// Generate an image, returning its URL.
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String>;

    /// Describe an image. `None` when the service had no answer.
    async fn analyze_image(&self, image_url: &str, question: &str) -> anyhow::Result<Option<String>>;

    /// Look up a track. `None` when nothing matched.
    async fn search_music(&self, query: &str) -> anyhow::Result<Option<Track>>;

    /// Resolve a TikTok link. `None` when the post has no video.
    async fn download_tiktok(&self, url: &str) -> anyhow::Result<Option<TikTokVideo>>;

    /// Restyle an image with a prompt.
    async fn edit_image(&self, image_url: &str, prompt: &str) -> anyhow::Result<EditedImage>;

    /// Upload media, returning its public URL.
    async fn upload_media(&self, bytes: Vec<u8>, filename: &str) -> anyhow::Result<String>;
}
