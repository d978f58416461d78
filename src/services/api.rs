//! HTTP client for the AI/media API and the upload backend.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use super::stream::SignalScanner;
use super::{EditedImage, ServiceError, Services, TikTokVideo, Track};
use crate::utils::RetryPolicy;

static UPLOAD_HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="(/uploads/[^"]+)""#).expect("valid upload pattern"));

/// Standard `{ success, result, message }` response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: Option<bool>,
    result: Option<T>,
    message: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<Option<T>, ServiceError> {
        if self.success == Some(false) {
            let message = self.message.unwrap_or_else(|| "no details".to_string());
            return Err(ServiceError::Unsuccessful(message));
        }
        Ok(self.result)
    }
}

#[derive(Debug, Deserialize)]
struct VisionAnswer {
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TikTokResult {
    detail: Option<TikTokVideo>,
}

#[derive(Debug, Deserialize)]
struct RetrievedImage {
    url: Option<String>,
}

/// `Services` over the bot's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    upload: Url,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(base: Url, upload: Url, retry: RetryPolicy) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(90)).build()?;
        Ok(Self {
            client,
            base,
            upload,
            retry,
        })
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ServiceError> {
        let url = self.base.join(path)?;
        debug!("POST {}", url);
        parse(self.client.post(url).json(body).send().await?).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ServiceError> {
        debug!("GET {}", url);
        parse(self.client.get(url).send().await?).await
    }

    /// Start a streamed job and wait for the URL of its result.
    async fn stream_job(&self, path: &str, body: &Value) -> Result<Url, ServiceError> {
        let url = self.base.join(path)?;
        let response = checked(self.client.post(url).json(body).send().await?)?;

        let mut chunks = response.bytes_stream();
        let mut scanner = SignalScanner::default();

        while let Some(chunk) = chunks.next().await {
            if let Some(signal) = scanner.push(&chunk?) {
                return Ok(Url::parse(&signal.into_url()?)?);
            }
        }

        let signal = scanner.finish().ok_or(ServiceError::StreamEnded)?;
        Ok(Url::parse(&signal.into_url()?)?)
    }
}

fn checked(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ServiceError::Status(status.as_u16()))
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    Ok(checked(response)?.json().await?)
}

#[async_trait]
impl Services for ApiClient {
    async fn chat(&self, prompt: &str) -> anyhow::Result<String> {
        let body = json!({ "message": prompt });
        self.retry
            .run("AI chat", || async {
                let envelope: Envelope<String> = self.post_json("api/ai/grok", &body).await?;
                let reply = envelope
                    .into_result()?
                    .ok_or_else(|| ServiceError::InvalidPayload("missing result".into()))?;
                Ok(reply)
            })
            .await
    }

    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String> {
        let job = self.stream_job("api/ai/vheer", &json!({ "prompt": prompt })).await?;
        let retrieved: RetrievedImage = self.get_json(job).await?;

        let url = retrieved
            .url
            .ok_or_else(|| ServiceError::InvalidPayload("temp result has no url".into()))?;
        info!("Image generated: {}", url);
        Ok(url)
    }

    async fn analyze_image(&self, image_url: &str, question: &str) -> anyhow::Result<Option<String>> {
        let body = json!({ "url": image_url, "question": question });
        self.retry
            .run("Vision", || async {
                let envelope: Envelope<VisionAnswer> =
                    self.post_json("api/ai/screenapp", &body).await?;
                Ok(envelope.into_result()?.and_then(|r| r.answer))
            })
            .await
    }

    async fn search_music(&self, query: &str) -> anyhow::Result<Option<Track>> {
        let mut url = self.base.join("api/play/soundcloud")?;
        url.query_pairs_mut().append_pair("q", query);

        self.retry
            .run("SoundCloud search", || async {
                let envelope: Envelope<Track> = self.get_json(url.clone()).await?;
                // An unsuccessful search means nothing matched.
                Ok(envelope.result.filter(|_| envelope.success != Some(false)))
            })
            .await
    }

    async fn download_tiktok(&self, url: &str) -> anyhow::Result<Option<TikTokVideo>> {
        let body = json!({ "url": url });
        self.retry
            .run("TikTok download", || async {
                let envelope: Envelope<TikTokResult> =
                    self.post_json("api/downloader/tiktok", &body).await?;
                Ok(envelope
                    .into_result()?
                    .and_then(|r| r.detail)
                    .filter(|d| d.video_url().is_some()))
            })
            .await
    }

    async fn edit_image(&self, image_url: &str, prompt: &str) -> anyhow::Result<EditedImage> {
        let body = json!({ "url": image_url, "prompt": prompt });
        let job = self.stream_job("api/tools/ghibli", &body).await?;
        Ok(self.get_json(job).await?)
    }

    async fn upload_media(&self, bytes: Vec<u8>, filename: &str) -> anyhow::Result<String> {
        let endpoint = self.upload.join("upload")?;

        self.retry
            .run("Upload", || async {
                let part = Part::bytes(bytes.clone()).file_name(filename.to_string());
                let form = Form::new().part("media", part);

                let response = self.client.post(endpoint.clone()).multipart(form).send().await?;
                let html = checked(response)?.text().await?;

                let href = UPLOAD_HREF
                    .captures(&html)
                    .map(|caps| caps[1].to_string())
                    .ok_or(ServiceError::UploadUnparsed)?;

                let url = self.upload.join(&href)?.to_string();
                info!("Media uploaded: {}", url);
                Ok(url)
            })
            .await
    }
}
