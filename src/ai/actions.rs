//! Side effects requested by AI trigger tags.
//!
//! The reply text goes out first, then each action in order. Every action
//! reacts with a "working" emoji, and finishes with ✅ plus a history note
//! on success or a localized failure message plus ❌ otherwise. A failing
//! action never stops the ones after it.

use tracing::{error, info};

use super::{AiTriggerResult, StickerParams, TriggerAction};
use crate::database::Role;
use crate::plugins::{MAX_STICKER_SECONDS, PluginContext, sticker_too_long, tiktok_caption};
use crate::transport::{MediaSource, Outbound};

/// How one action ended.
#[derive(Debug)]
enum ActionOutcome {
    /// Delivered; the note is recorded in history.
    Done { note: String },
    /// The service found nothing for the request.
    NotFound,
    /// Refused before calling out, with a message for the user.
    Declined(String),
}

impl TriggerAction {
    fn working_emoji(&self) -> &'static str {
        match self {
            Self::GenerateImage { .. } => "🎨",
            Self::PlayMusic { .. } => "🎵",
            Self::MakeSticker(_) => "⏳",
            Self::DownloadTiktok { .. } => "⬇️",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::GenerateImage { .. } => "image",
            Self::PlayMusic { .. } => "music",
            Self::MakeSticker(_) => "sticker",
            Self::DownloadTiktok { .. } => "tiktok",
        }
    }

    /// Message keys for "nothing found" and "failed".
    fn failure_keys(&self) -> (&'static str, &'static str) {
        match self {
            Self::GenerateImage { .. } => ("ai.image_failed", "ai.image_failed"),
            Self::PlayMusic { .. } => ("ai.music_not_found", "ai.music_failed"),
            Self::MakeSticker(_) => ("ai.sticker_failed", "ai.sticker_failed"),
            Self::DownloadTiktok { .. } => ("ai.tiktok_not_found", "ai.tiktok_failed"),
        }
    }
}

/// Send the reply, then run every requested action.
///
/// Only a failure to deliver the reply itself is returned as an error.
pub async fn run_ai_turn(ctx: &PluginContext, result: &AiTriggerResult) -> anyhow::Result<()> {
    ctx.reply(result.reply_text.as_str()).await?;

    for action in &result.actions {
        ctx.react(action.working_emoji()).await;

        let (not_found_key, failed_key) = action.failure_keys();
        let failure = match perform(ctx, action).await {
            Ok(ActionOutcome::Done { note }) => {
                info!("AI {} action done in {}", action.label(), ctx.event.chat_id);
                ctx.react("✅").await;
                record(ctx, &note).await;
                continue;
            }
            Ok(ActionOutcome::NotFound) => ctx.t(not_found_key),
            Ok(ActionOutcome::Declined(message)) => message,
            Err(e) => {
                error!("AI {} action failed: {}", action.label(), e);
                ctx.t(failed_key)
            }
        };

        if let Err(e) = ctx.reply(failure).await {
            error!("Failed to report {} action failure: {}", action.label(), e);
        }
        ctx.react("❌").await;
    }
    Ok(())
}

async fn perform(ctx: &PluginContext, action: &TriggerAction) -> anyhow::Result<ActionOutcome> {
    let services = &ctx.state.services;

    match action {
        TriggerAction::GenerateImage { prompt } => {
            let url = services.generate_image(prompt).await?;
            ctx.send(Outbound::Image {
                source: MediaSource::url(url),
                caption: Some(format!("🎨 {}", prompt)),
            })
            .await?;
            Ok(ActionOutcome::Done {
                note: format!("[Image created successfully for prompt: {}]", prompt),
            })
        }
        TriggerAction::PlayMusic { query } => {
            let Some(track) = services.search_music(query).await? else {
                return Ok(ActionOutcome::NotFound);
            };
            info!("Playing {} ({})", track.title, track.duration_label());
            ctx.send(Outbound::Audio {
                source: MediaSource::url(track.url.as_str()),
                mimetype: "audio/mp4".to_string(),
            })
            .await?;
            Ok(ActionOutcome::Done {
                note: format!("[Music played successfully: {}]", track.title),
            })
        }
        TriggerAction::MakeSticker(params) => make_sticker(ctx, params).await,
        TriggerAction::DownloadTiktok { url } => {
            let Some(video) = services.download_tiktok(url).await? else {
                return Ok(ActionOutcome::NotFound);
            };
            let Some(video_url) = video.video_url() else {
                return Ok(ActionOutcome::NotFound);
            };
            ctx.send(Outbound::Video {
                source: MediaSource::url(video_url),
                caption: Some(tiktok_caption(&video, &ctx.state.config.footer)),
            })
            .await?;
            Ok(ActionOutcome::Done {
                note: format!("[TikTok video downloaded: {}]", video.title),
            })
        }
    }
}

async fn make_sticker(ctx: &PluginContext, params: &StickerParams) -> anyhow::Result<ActionOutcome> {
    let source = match &params.url {
        Some(url) => MediaSource::url(url.as_str()),
        None => match ctx.event.media_or_quoted() {
            Some(media) if sticker_too_long(media) => {
                let max = MAX_STICKER_SECONDS.to_string();
                return Ok(ActionOutcome::Declined(ctx.tf("sticker.too_long", &[("max", &max)])));
            }
            Some(media) => MediaSource::Message { media: media.clone() },
            None => return Ok(ActionOutcome::NotFound),
        },
    };

    ctx.send(Outbound::Sticker {
        source,
        pack: params.pack.clone(),
        author: params.author.clone(),
    })
    .await?;
    Ok(ActionOutcome::Done {
        note: "[Sticker created successfully]".to_string(),
    })
}

async fn record(ctx: &PluginContext, note: &str) {
    let bot_name = &ctx.state.config.bot_name;
    if let Err(e) = ctx
        .state
        .history
        .add(&ctx.event.chat_id, Role::Assistant, note, bot_name)
        .await
    {
        error!("Failed to record action in history: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::parse_triggers;
    use crate::i18n::get_text;
    use crate::services::Track;
    use crate::test_support::Harness;

    const USER: &str = "62899@s.whatsapp.net";

    #[tokio::test]
    async fn test_reply_goes_out_before_actions() {
        let harness = Harness::new();
        harness.services.set_image("https://img.example/cat.png");
        let ctx = harness.context(USER, ".ai draw a cat");

        let result = parse_triggers("<message>Sure</message><image_generator>cat</image_generator>", "id");
        run_ai_turn(&ctx, &result).await.unwrap();

        let sent = harness.transport.sent();
        assert_eq!(sent[0].1.as_text(), Some("Sure"));
        assert!(sent.iter().any(|(_, m)| matches!(
            m,
            Outbound::Image { source: MediaSource::Url { url }, .. } if url == "https://img.example/cat.png"
        )));
        assert_eq!(harness.transport.reactions(), vec!["🎨", "✅"]);

        let history = harness.state.history.recent(&ctx.event.chat_id, 5).await.unwrap();
        assert_eq!(history[0].message, "[Image created successfully for prompt: cat]");
        assert_eq!(history[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_music_not_found() {
        let harness = Harness::new();
        harness.services.set_track(None);
        let ctx = harness.context(USER, ".ai play x");

        let result = parse_triggers("<play_music>x</play_music>", "id");
        run_ai_turn(&ctx, &result).await.unwrap();

        let texts = harness.transport.texts();
        assert_eq!(texts[0], get_text("id", "ai.processing"));
        assert_eq!(texts[1], get_text("id", "ai.music_not_found"));
        assert_eq!(harness.transport.reactions(), vec!["🎵", "❌"]);
        assert!(harness.state.history.recent(&ctx.event.chat_id, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_music_sends_audio() {
        let harness = Harness::new();
        harness.services.set_track(Some(Track {
            title: "Bertaut".to_string(),
            url: "https://snd.example/a.m4a".to_string(),
            duration: serde_json::Value::Null,
        }));
        let ctx = harness.context(USER, ".ai play bertaut");

        run_ai_turn(&ctx, &parse_triggers("<play_music>bertaut</play_music>", "id")).await.unwrap();

        assert!(harness.transport.sent().iter().any(|(_, m)| matches!(
            m,
            Outbound::Audio { mimetype, .. } if mimetype == "audio/mp4"
        )));
        let history = harness.state.history.recent(&ctx.event.chat_id, 5).await.unwrap();
        assert_eq!(history[0].message, "[Music played successfully: Bertaut]");
    }

    #[tokio::test]
    async fn test_failed_action_does_not_stop_the_next() {
        let harness = Harness::new();
        harness.services.fail_image();
        harness.services.set_track(Some(Track {
            title: "Song".to_string(),
            url: "https://snd.example/s.m4a".to_string(),
            duration: serde_json::Value::Null,
        }));
        let ctx = harness.context(USER, ".ai both");

        let result = parse_triggers(
            "<message>ok</message><play_music>song</play_music><image_generator>cat</image_generator>",
            "id",
        );
        run_ai_turn(&ctx, &result).await.unwrap();

        assert!(harness.transport.texts().contains(&get_text("id", "ai.image_failed")));
        assert_eq!(harness.transport.reactions(), vec!["🎨", "❌", "🎵", "✅"]);
    }

    #[tokio::test]
    async fn test_sticker_without_media_fails() {
        let harness = Harness::new();
        let ctx = harness.context(USER, ".ai make a sticker");

        run_ai_turn(&ctx, &parse_triggers("<sticker_generator>Pack|Me</sticker_generator>", "id"))
            .await
            .unwrap();

        assert!(harness.transport.texts().contains(&get_text("id", "ai.sticker_failed")));
    }

    #[tokio::test]
    async fn test_sticker_from_url_uses_params() {
        let harness = Harness::new();
        let ctx = harness.context(USER, ".ai sticker");

        let result = parse_triggers(
            "<sticker_generator>https://img.example/a.png|Pack|Me</sticker_generator>",
            "id",
        );
        run_ai_turn(&ctx, &result).await.unwrap();

        assert!(harness.transport.sent().iter().any(|(_, m)| matches!(
            m,
            Outbound::Sticker { pack, author, source: MediaSource::Url { .. } } if pack == "Pack" && author == "Me"
        )));
    }
}
