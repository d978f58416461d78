//! Sticker maker plugin.
//!
//! Conversion to WebP happens on the bridge; this only picks the source
//! media and enforces the video length limit.

use async_trait::async_trait;
use tracing::warn;

use super::{Plugin, PluginContext};
use crate::message::{MediaKind, MediaRef};
use crate::transport::{MediaSource, Outbound};

/// Longest video accepted for an animated sticker, in seconds.
pub const MAX_VIDEO_SECONDS: u32 = 10;

pub struct Sticker;

#[async_trait]
impl Plugin for Sticker {
    fn name(&self) -> &'static str {
        "sticker"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["sticker", "s", "stiker"]
    }

    fn tag(&self) -> &'static str {
        "tools"
    }

    fn help(&self) -> &'static str {
        "Turn an image or short video into a sticker"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        let Some(media) = ctx.event.media_or_quoted() else {
            return ctx.reply(ctx.tf("sticker.usage", &[])).await;
        };
        if too_long(media) {
            return ctx
                .reply(ctx.tf("sticker.too_long", &[("max", &MAX_VIDEO_SECONDS.to_string())]))
                .await;
        }

        ctx.react("⏳").await;

        let config = &ctx.state.config;
        let sticker = Outbound::Sticker {
            source: MediaSource::Message { media: media.clone() },
            pack: config.bot_name.clone(),
            author: config.owner_name.clone(),
        };

        if let Err(e) = ctx.send(sticker).await {
            warn!("Sticker conversion failed in {}: {}", ctx.event.chat_id, e);
            return ctx.reply(ctx.tf("sticker.failed", &[("error", &e.to_string())])).await;
        }
        ctx.react("✅").await;
        Ok(())
    }
}

pub fn too_long(media: &MediaRef) -> bool {
    media.kind == MediaKind::Video && media.seconds().unwrap_or(0) > MAX_VIDEO_SECONDS
}
