//! TikTok downloader plugin.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::{Plugin, PluginContext};
use crate::services::TikTokVideo;
use crate::transport::{MediaSource, Outbound};

static TIKTOK_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tiktok\.com").expect("valid tiktok pattern"));

pub struct TikTok;

#[async_trait]
impl Plugin for TikTok {
    fn name(&self) -> &'static str {
        "tiktok"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["tiktok", "tt", "tiktokdl"]
    }

    fn tag(&self) -> &'static str {
        "downloader"
    }

    fn help(&self) -> &'static str {
        "Download a TikTok video without watermark"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        let Some(url) = ctx.args().first() else {
            return ctx.reply(ctx.tf("tiktok.usage", &[])).await;
        };
        if !TIKTOK_URL.is_match(url) {
            return ctx.reply(ctx.t("tiktok.invalid")).await;
        }

        ctx.react("⏳").await;

        let video = match ctx.state.services.download_tiktok(url).await {
            Ok(Some(video)) => video,
            Ok(None) => return ctx.reply(ctx.t("tiktok.not_found")).await,
            Err(e) => {
                warn!("TikTok download failed for {}: {}", url, e);
                return ctx.reply(ctx.tf("tiktok.error", &[("error", &e.to_string())])).await;
            }
        };
        let Some(video_url) = video.video_url() else {
            return ctx.reply(ctx.t("tiktok.not_found")).await;
        };

        ctx.send(Outbound::Video {
            source: MediaSource::url(video_url),
            caption: Some(caption(&video, &ctx.state.config.footer)),
        })
        .await?;
        ctx.react("✅").await;
        Ok(())
    }
}

/// Caption for a downloaded video.
pub fn caption(video: &TikTokVideo, footer: &str) -> String {
    let mut lines = vec![
        "🎬 *TIKTOK DOWNLOADER*".to_string(),
        String::new(),
        format!("👤 *Author:* {} (@{})", video.author.nickname, video.author.unique_id),
        format!("📝 *Title:* {}", video.title),
    ];
    if !video.music_info.title.is_empty() {
        lines.push(format!("🎵 *Music:* {} - {}", video.music_info.title, video.music_info.author));
    }
    if let Some(seconds) = video.duration {
        lines.push(format!("⏱️ *Duration:* {}s", seconds));
    }
    if let Some(date) = video
        .create_time
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
    {
        lines.push(format!("📅 *Created:* {}", date.format("%d/%m/%Y")));
    }
    lines.push(String::new());
    lines.push(format!("_{}_", footer));
    lines.join("\n")
}
