//! Anti-link toggle for groups.

use async_trait::async_trait;
use tracing::info;

use super::{Plugin, PluginContext};

pub struct AntiLink;

#[async_trait]
impl Plugin for AntiLink {
    fn name(&self) -> &'static str {
        "antilink"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["antilink"]
    }

    fn tag(&self) -> &'static str {
        "group"
    }

    fn help(&self) -> &'static str {
        "Delete WhatsApp invite links from non-admins"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        let chat_id = &ctx.event.chat_id;

        if !ctx.event.is_group {
            return ctx.reply(ctx.t("common.group_only")).await;
        }
        if !ctx.state.permissions.is_admin(chat_id, &ctx.event.sender_id).await? {
            return ctx.reply(ctx.t("common.admin_only")).await;
        }

        let settings = &ctx.state.settings;
        let choice = ctx.args().first().map(|a| a.to_lowercase());

        match choice.as_deref() {
            Some("on") => {
                settings.set_antilink(chat_id, true).await?;
                info!("Anti-link enabled in {}", chat_id);
                ctx.reply(ctx.t("antilink.enabled")).await
            }
            Some("off") => {
                settings.set_antilink(chat_id, false).await?;
                info!("Anti-link disabled in {}", chat_id);
                ctx.reply(ctx.t("antilink.disabled")).await
            }
            _ => {
                let status = if settings.antilink_enabled(chat_id).await? { "ON" } else { "OFF" };
                ctx.reply(ctx.tf("antilink.status", &[("status", status)])).await
            }
        }
    }
}
