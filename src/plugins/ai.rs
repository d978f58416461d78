//! Alicia AI chat plugin with image understanding.

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::{Plugin, PluginContext};
use crate::ai::prompt::{HISTORY_WINDOW, build_prompt, clean_response};
use crate::ai::{parse_triggers, run_ai_turn};
use crate::database::Role;

pub struct Ai;

#[async_trait]
impl Plugin for Ai {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["ai", "alicia", "grok"]
    }

    fn tag(&self) -> &'static str {
        "ai"
    }

    fn help(&self) -> &'static str {
        "Chat with Alicia AI (text and images)"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        ctx.react("💭").await;

        let mut user_message = ctx.text().trim().to_string();
        let mut visual_context = String::new();

        if ctx.event.image_or_quoted().is_some() {
            ctx.react("👀").await;
            match describe_image(ctx, &user_message).await {
                Ok(note) => visual_context = note,
                Err(e) => {
                    warn!("Image analysis failed in {}: {}", ctx.event.chat_id, e);
                    return ctx.reply(ctx.tf("ai.vision_failed", &[("error", &e.to_string())])).await;
                }
            }
            if user_message.is_empty() {
                user_message = ctx.t("ai.image_question");
            }
            ctx.react("🧠").await;
        }

        if user_message.is_empty() && visual_context.is_empty() {
            return ctx.reply(ctx.t("ai.greeting")).await;
        }

        let full_input = if visual_context.is_empty() {
            user_message
        } else {
            format!("{}\n\n{}", visual_context, user_message)
        };

        let chat_id = &ctx.event.chat_id;
        let history = ctx.state.history.recent(chat_id, HISTORY_WINDOW).await?;
        let prompt = build_prompt(&history, &full_input);
        debug!("AI prompt for {} is {} chars", chat_id, prompt.len());

        let raw = ctx.state.services.chat(&prompt).await?;
        let result = parse_triggers(&clean_response(&raw), ctx.locale());

        // Past this point the turn must not be retried: history is best-effort.
        remember(ctx, Role::User, &full_input, &ctx.event.display_name).await;
        run_ai_turn(ctx, &result).await?;
        remember(ctx, Role::Assistant, &result.reply_text, &ctx.state.config.bot_name).await;

        ctx.react("✨").await;
        Ok(())
    }
}

async fn remember(ctx: &PluginContext, role: Role, message: &str, sender_name: &str) {
    if let Err(e) = ctx.state.history.add(&ctx.event.chat_id, role, message, sender_name).await {
        error!("Failed to record {:?} turn in {}: {}", role, ctx.event.chat_id, e);
    }
}

/// Upload the attached image and ask the vision service about it.
/// Returns the system note prepended to the user's message.
async fn describe_image(ctx: &PluginContext, request: &str) -> anyhow::Result<String> {
    let Some(image) = ctx.event.image_or_quoted() else {
        return Ok(String::new());
    };

    let bytes = ctx.state.transport.download_media(image).await?;
    let url = ctx.state.services.upload_media(bytes, "image.jpg").await?;

    let question = if request.is_empty() {
        "Describe this image in detail.".to_string()
    } else {
        format!(
            "Please analyze this image specifically focusing on this request: \"{}\". Describe it in detail relevant to the request.",
            request
        )
    };

    Ok(match ctx.state.services.analyze_image(&url, &question).await? {
        Some(answer) => ctx.tf("ai.vision_note", &[("answer", &answer)]),
        None => ctx.t("ai.vision_note_empty"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::get_text;
    use crate::test_support::{Harness, private_message, with_image};

    const USER: &str = "62899@s.whatsapp.net";

    #[tokio::test]
    async fn test_empty_invocation_greets() {
        let harness = Harness::new();
        Ai.run(&harness.context(USER, ".ai")).await.unwrap();

        assert_eq!(harness.transport.texts(), vec![get_text("id", "ai.greeting")]);
        assert!(harness.services.calls().is_empty());
    }

    #[tokio::test]
    async fn test_chat_records_both_sides() {
        let harness = Harness::new();
        harness.services.set_chat("Alicia: <message>Halo juga!</message>");

        Ai.run(&harness.context(USER, ".ai halo")).await.unwrap();

        assert_eq!(harness.transport.texts(), vec!["Halo juga!".to_string()]);
        let history = harness.state.history.recent(USER, 5).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].role, history[0].message.as_str()), (Role::User, "halo"));
        assert_eq!((history[1].role, history[1].message.as_str()), (Role::Assistant, "Halo juga!"));

        let prompt = harness.services.last_prompt().unwrap();
        assert!(prompt.ends_with("User: halo\nAlicia:"));
    }

    #[tokio::test]
    async fn test_image_adds_vision_note() {
        let harness = Harness::new();
        harness.services.set_chat("Kucing lucu");
        harness.services.set_vision(Some("an orange cat"));
        let msg = with_image(private_message(USER, ".ai"));

        Ai.run(&harness.context_for(&msg)).await.unwrap();

        let calls = harness.services.calls();
        assert_eq!(calls[0], "upload_media:image.jpg");
        assert!(calls[1].starts_with("analyze_image:"));
        assert!(calls[1].contains("Describe this image in detail."));

        let history = harness.state.history.recent(USER, 5).await.unwrap();
        assert!(history[0].message.contains("an orange cat"));
        assert!(history[0].message.ends_with(&get_text("id", "ai.image_question")));
    }

    #[tokio::test]
    async fn test_chat_failure_propagates() {
        let harness = Harness::new();
        harness.services.fail_chat();

        assert!(Ai.run(&harness.context(USER, ".ai halo")).await.is_err());
        assert!(harness.state.history.recent(USER, 5).await.unwrap().is_empty());
    }
}
