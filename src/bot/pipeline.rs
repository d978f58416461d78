//! Per-message dispatch pipeline.
//!
//! Filter, auto-read, guard, static commands, parse, then either record
//! free text to history or run the matching plugin under the retry policy.
//! Steps run strictly in order for one message; nothing here is shared
//! between messages except through `AppState`.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::config::AntiBan;
use crate::database::Role;
use crate::events::{antilink, static_commands};
use crate::i18n::get_text;
use crate::message::{InboundEvent, MediaRef, WebMessage};
use crate::plugins::PluginContext;
use crate::transport::{Presence, STATUS_BROADCAST};
use crate::utils::{Classified, parse_command};

/// Where a message's trip through the pipeline ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Own message, status broadcast, or nothing to act on.
    Filtered,
    /// Stopped by the anti-link guard.
    Guarded,
    /// Answered by a bare-word static command.
    Static,
    /// Free text written to history.
    Recorded,
    /// Prefixed, but no plugin claims the command.
    UnknownCommand,
    Executed,
    /// Every attempt failed; the error was reported to the chat.
    Failed,
}

/// Run one inbound message through the pipeline. Never fails: errors are
/// logged and, for plugin failures, reported to the chat.
pub async fn dispatch(state: &AppState, msg: &WebMessage) -> DispatchOutcome {
    if msg.key.from_me || msg.key.remote_jid == STATUS_BROADCAST {
        return DispatchOutcome::Filtered;
    }
    let Some(event) = InboundEvent::from_message(msg) else {
        return DispatchOutcome::Filtered;
    };
    // Reactions, protocol messages and the like carry nothing to act on.
    if event.raw_text.is_empty() && event.media.is_none() {
        return DispatchOutcome::Filtered;
    }

    if state.config.auto_read
        && let Err(e) = state.transport.read_messages(std::slice::from_ref(&event.key)).await
    {
        debug!("Auto-read failed for {}: {}", event.chat_id, e);
    }

    match antilink::check(state, &event).await {
        Ok(outcome) if outcome.passes() => {}
        Ok(outcome) => {
            debug!("Guard stopped message in {}: {:?}", event.chat_id, outcome);
            return DispatchOutcome::Guarded;
        }
        Err(e) => {
            error!("Anti-link check failed in {}: {}", event.chat_id, e);
            return DispatchOutcome::Guarded;
        }
    }

    match static_commands::handle(state, &event).await {
        Ok(true) => return DispatchOutcome::Static,
        Ok(false) => {}
        Err(e) => {
            warn!("Static reply failed in {}: {}", event.chat_id, e);
            return DispatchOutcome::Static;
        }
    }

    let command = match parse_command(&event.raw_text) {
        Classified::Command(command) => command,
        Classified::Text(text) => return record_text(state, &event, text).await,
    };

    let Some(descriptor) = state.plugins.lookup(&command.command) else {
        debug!("Unknown command '{}' in {}", command.command, event.chat_id);
        return DispatchOutcome::UnknownCommand;
    };

    info!(
        "Command {}{} from {} in {}",
        command.prefix, command.command, event.display_name, event.chat_id
    );
    humanize(state, &event.chat_id).await;

    let ctx = PluginContext::new(state.clone(), event, command);
    let label = format!("Plugin {}", ctx.command_name());
    let result = state
        .config
        .plugin_retry
        .run(&label, || descriptor.handler.run(&ctx))
        .await;

    match result {
        Ok(()) => {
            let note = format!("Executed: {}", ctx.command_name());
            if let Err(e) = state
                .history
                .add(&ctx.event.chat_id, Role::System, &note, &ctx.event.display_name)
                .await
            {
                warn!("Failed to log command execution: {}", e);
            }
            DispatchOutcome::Executed
        }
        Err(e) => {
            error!("{} failed after retries: {:#}", label, e);
            if let Err(send_err) = ctx.reply(ctx.tf("common.error", &[("error", &e.to_string())])).await {
                error!("Failed to report plugin error: {}", send_err);
            }
            DispatchOutcome::Failed
        }
    }
}

/// Non-command path: the bot listens without replying.
async fn record_text(state: &AppState, event: &InboundEvent, text: String) -> DispatchOutcome {
    let mut message = text;

    let image = event.media.as_ref().filter(|m| m.is_image());
    if let Some(image) = image.filter(|_| state.config.auto_upload_images) {
        match upload_image(state, image).await {
            Ok(url) => {
                info!("Image auto-uploaded: {}", url);
                if message.is_empty() {
                    message = get_text(&state.config.locale, "ai.history_image_question");
                }
                message = format!("[Image: {}] {}", url, message);
            }
            Err(e) => warn!("Failed to auto-upload image: {}", e),
        }
    }

    if message.is_empty() {
        return DispatchOutcome::Filtered;
    }

    if let Err(e) = state
        .history
        .add(&event.chat_id, Role::User, &message, &event.display_name)
        .await
    {
        error!("Failed to record history for {}: {}", event.chat_id, e);
    }
    DispatchOutcome::Recorded
}

async fn upload_image(state: &AppState, image: &MediaRef) -> anyhow::Result<String> {
    let bytes = state.transport.download_media(image).await?;
    state.services.upload_media(bytes, "image.jpg").await
}

/// Typing indicator plus a random pause before the handler runs.
async fn humanize(state: &AppState, chat_id: &str) {
    let anti_ban = &state.config.anti_ban;
    if !anti_ban.typing {
        return;
    }

    if let Err(e) = state.transport.presence_update(chat_id, Presence::Composing).await {
        debug!("Presence update failed for {}: {}", chat_id, e);
    }

    tokio::time::sleep(sample_delay(anti_ban)).await;
}

/// Uniform draw from the inclusive `[min_delay, max_delay]` window.
fn sample_delay(anti_ban: &AntiBan) -> Duration {
    let min = anti_ban.min_delay.as_millis() as u64;
    let max = anti_ban.max_delay.as_millis() as u64;
    Duration::from_millis(rand::rng().random_range(min..=max))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::test_support::{
        FlakyStore, Harness, group_message, group_with_admins, private_message, test_config, with_image,
    };
    use crate::transport::Outbound;

    const USER: &str = "62899@s.whatsapp.net";
    const GROUP: &str = "120363@g.us";

    #[tokio::test]
    async fn test_own_and_status_messages_are_filtered() {
        let harness = Harness::new();

        let mut own = private_message(USER, ".ping");
        own.key.from_me = true;
        assert_eq!(dispatch(&harness.state, &own).await, DispatchOutcome::Filtered);

        let mut status = private_message(USER, "hello");
        status.key.remote_jid = STATUS_BROADCAST.to_string();
        assert_eq!(dispatch(&harness.state, &status).await, DispatchOutcome::Filtered);

        let mut empty = private_message(USER, "");
        empty.message = None;
        assert_eq!(dispatch(&harness.state, &empty).await, DispatchOutcome::Filtered);

        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_free_text_is_recorded_silently() {
        let harness = Harness::new();

        let outcome = dispatch(&harness.state, &private_message(USER, "halo semua")).await;

        assert_eq!(outcome, DispatchOutcome::Recorded);
        assert!(harness.transport.texts().is_empty());
        let history = harness.state.history.recent(USER, 5).await.unwrap();
        assert_eq!(history[0].message, "halo semua");
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].sender_name, "Tester");
    }

    #[tokio::test]
    async fn test_auto_read_marks_message() {
        let harness = Harness::new();
        dispatch(&harness.state, &private_message(USER, "halo")).await;
        assert_eq!(harness.transport.read_count(), 1);
    }

    #[tokio::test]
    async fn test_image_is_uploaded_into_history() {
        let harness = Harness::new();
        let msg = with_image(private_message(USER, ""));

        assert_eq!(dispatch(&harness.state, &msg).await, DispatchOutcome::Recorded);

        let history = harness.state.history.recent(USER, 5).await.unwrap();
        assert_eq!(
            history[0].message,
            format!("[Image: https://files.example/uploads/1.jpg] {}", get_text("id", "ai.history_image_question"))
        );
    }

    #[tokio::test]
    async fn test_static_command_short_circuits() {
        let harness = Harness::with_manifests(&[("main/ping.toml", "handler = \"ping\"\n")]);

        let outcome = dispatch(&harness.state, &private_message(USER, "PING")).await;

        assert_eq!(outcome, DispatchOutcome::Static);
        assert_eq!(harness.transport.texts(), vec![get_text("id", "static.pong")]);
        assert!(harness.state.history.recent(USER, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_is_silent() {
        let harness = Harness::new();

        let outcome = dispatch(&harness.state, &private_message(USER, ".nosuch arg")).await;

        assert_eq!(outcome, DispatchOutcome::UnknownCommand);
        assert!(harness.transport.sent().is_empty());
        assert!(harness.state.history.recent(USER, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_executed_command_is_logged() {
        let harness = Harness::with_manifests(&[("main/ping.toml", "handler = \"ping\"\n")]);

        let outcome = dispatch(&harness.state, &private_message(USER, ".P")).await;

        assert_eq!(outcome, DispatchOutcome::Executed);
        let history = harness.state.history.recent(USER, 5).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].message, "Executed: p");
    }

    #[tokio::test]
    async fn test_failing_plugin_is_retried_then_reported() {
        let harness = Harness::with_manifests(&[("ai/ai.toml", "handler = \"ai\"\n")]);
        harness.services.fail_chat();

        let outcome = dispatch(&harness.state, &private_message(USER, ".ai halo")).await;

        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(harness.services.chat_attempts(), 3);

        let texts = harness.transport.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("❌ Error:"));
        assert!(harness.state.history.recent(USER, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guard_stops_link_before_dispatch() {
        let harness = Harness::with_manifests(&[("main/ping.toml", "handler = \"ping\"\n")]);
        harness.state.settings.set_antilink(GROUP, true).await.unwrap();
        harness.transport.set_group(group_with_admins(
            GROUP,
            &["62800@s.whatsapp.net"],
            &["62844@s.whatsapp.net"],
        ));

        let msg = group_message(GROUP, "62844@s.whatsapp.net", ".ping https://chat.whatsapp.com/xyz");
        let outcome = dispatch(&harness.state, &msg).await;

        assert_eq!(outcome, DispatchOutcome::Guarded);
        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0].1, Outbound::Delete { .. }));
        assert!(harness.state.history.recent(GROUP, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guard_error_fails_closed() {
        let harness = Harness::new();
        harness.state.settings.set_antilink(GROUP, true).await.unwrap();
        // No metadata registered: the lookup fails.

        let msg = group_message(GROUP, "62844@s.whatsapp.net", "wa.me/62811");
        assert_eq!(dispatch(&harness.state, &msg).await, DispatchOutcome::Guarded);
        assert!(harness.state.history.recent(GROUP, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_humanize_sends_composing_presence() {
        let mut config = test_config();
        config.anti_ban = AntiBan::new(true, Duration::ZERO, Duration::from_millis(5));
        let harness = Harness::with_config(config, &[("main/ping.toml", "handler = \"ping\"\n")]);

        dispatch(&harness.state, &private_message(USER, ".ping")).await;

        assert!(harness.transport.presences().contains(&Presence::Composing));
    }

    #[test]
    fn test_sample_delay_stays_in_window() {
        let anti_ban = AntiBan::new(true, Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..500 {
            let delay = sample_delay(&anti_ban);
            assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_sample_delay_fixed_window() {
        let anti_ban = AntiBan::new(true, Duration::from_millis(250), Duration::from_millis(250));
        assert_eq!(sample_delay(&anti_ban), Duration::from_millis(250));
    }

    #[test]
    fn test_sample_delay_inverted_window() {
        let anti_ban = AntiBan::new(true, Duration::from_millis(3000), Duration::from_millis(1000));
        for _ in 0..200 {
            let delay = sample_delay(&anti_ban);
            assert!(delay >= Duration::from_millis(1000) && delay <= Duration::from_millis(3000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_humanize_sleeps_for_fixed_window() {
        let mut config = test_config();
        config.anti_ban = AntiBan::new(true, Duration::from_secs(2), Duration::from_secs(2));
        let harness = Harness::with_config(config, &[]);

        let started = tokio::time::Instant::now();
        humanize(&harness.state, USER).await;

        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_reaction_is_dropped_before_auto_read() {
        let harness = Harness::new();
        let msg: WebMessage = serde_json::from_value(json!({
            "key": { "remoteJid": USER, "id": "R1" },
            "pushName": "Tester",
            "message": { "reactionMessage": { "text": "👍" } }
        }))
        .unwrap();

        assert_eq!(dispatch(&harness.state, &msg).await, DispatchOutcome::Filtered);
        assert_eq!(harness.transport.read_count(), 0);
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_ai_turn_is_not_repeated_when_history_write_fails() {
        let store = Arc::new(FlakyStore::failing(Role::Assistant));
        let harness =
            Harness::with_store(test_config(), store.clone(), &[("ai/ai.toml", "handler = \"ai\"\n")]);
        harness
            .services
            .set_chat("<message>Siap</message><image_generator>cat</image_generator>");
        harness.services.set_image("https://img.example/cat.png");

        let outcome = dispatch(&harness.state, &private_message(USER, ".ai gambar kucing")).await;

        assert_eq!(outcome, DispatchOutcome::Executed);
        assert_eq!(harness.transport.texts(), vec!["Siap".to_string()]);
        assert_eq!(harness.services.chat_attempts(), 1);
        let generations = harness
            .services
            .calls()
            .iter()
            .filter(|c| c.starts_with("generate_image:"))
            .count();
        assert_eq!(generations, 1);

        let entries = store.entries(USER).await;
        let users: Vec<_> = entries.iter().filter(|e| e.role == Role::User).collect();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].message, "gambar kucing");
    }

    #[tokio::test]
    async fn test_view_once_command_is_parsed() {
        let harness = Harness::with_manifests(&[("main/ping.toml", "handler = \"ping\"\n")]);
        let msg: WebMessage = serde_json::from_value(json!({
            "key": { "remoteJid": USER, "id": "V1" },
            "pushName": "Tester",
            "message": { "ephemeralMessage": { "message": { "conversation": ".ping" } } }
        }))
        .unwrap();

        assert_eq!(dispatch(&harness.state, &msg).await, DispatchOutcome::Executed);
    }
}
