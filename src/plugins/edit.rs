//! AI image editing plugin.

use async_trait::async_trait;
use tracing::warn;

use super::{Plugin, PluginContext};
use crate::transport::{MediaSource, Outbound};

pub struct Edit;

#[async_trait]
impl Plugin for Edit {
    fn name(&self) -> &'static str {
        "edit"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["edit", "ghibli"]
    }

    fn tag(&self) -> &'static str {
        "tools"
    }

    fn help(&self) -> &'static str {
        "Restyle an image with AI"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        let Some(image) = ctx.event.image_or_quoted() else {
            return ctx.reply(ctx.tf("edit.usage", &[])).await;
        };
        let prompt = match ctx.text().trim() {
            "" => ctx.t("edit.default_prompt"),
            text => text.to_string(),
        };

        ctx.react("🎨").await;

        let result = async {
            let bytes = ctx.state.transport.download_media(image).await?;
            let url = ctx.state.services.upload_media(bytes, "image.jpg").await?;
            ctx.state.services.edit_image(&url, &prompt).await
        }
        .await;

        let edited = match result {
            Ok(edited) => edited,
            Err(e) => {
                warn!("Image edit failed in {}: {}", ctx.event.chat_id, e);
                return ctx.reply(ctx.tf("edit.failed", &[("error", &e.to_string())])).await;
            }
        };

        let caption = format!(
            "✨ *Edit Result*\nPrompt: {}\nSource: {}",
            prompt,
            edited.source.as_deref().unwrap_or("AI")
        );
        ctx.send(Outbound::Image {
            source: MediaSource::url(edited.output),
            caption: Some(caption),
        })
        .await?;
        ctx.react("✅").await;
        Ok(())
    }
}
