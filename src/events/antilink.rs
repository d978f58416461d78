//! Anti-link guard for group chats.
//!
//! Runs before command dispatch. A guarded message never reaches the
//! parser or the history log.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::bot::AppState;
use crate::i18n::get_text;
use crate::message::InboundEvent;
use crate::transport::Outbound;

static LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)chat\.whatsapp\.com/|wa\.me/").expect("valid link pattern")
});

/// What the guard decided for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Not subject to the policy, or the sender is allowed to post links.
    Pass,
    /// The link was deleted.
    Deleted,
    /// The policy is on but the bot lacks the role to delete; a warning
    /// was sent instead.
    Unenforceable,
}

impl GuardOutcome {
    /// Whether the message continues down the pipeline.
    pub fn passes(self) -> bool {
        self == Self::Pass
    }
}

pub fn contains_group_link(text: &str) -> bool {
    LINK_PATTERN.is_match(text)
}

/// Apply the anti-link policy to an inbound message.
pub async fn check(state: &AppState, event: &InboundEvent) -> anyhow::Result<GuardOutcome> {
    if !event.is_group || !contains_group_link(&event.raw_text) {
        return Ok(GuardOutcome::Pass);
    }

    let chat_id = &event.chat_id;
    if !state.settings.antilink_enabled(chat_id).await? {
        return Ok(GuardOutcome::Pass);
    }

    if state.permissions.is_admin(chat_id, &event.sender_id).await? {
        debug!("Admin {} may post links in {}", event.sender_id, chat_id);
        return Ok(GuardOutcome::Pass);
    }

    if state.permissions.bot_is_admin(chat_id).await? {
        state
            .transport
            .send(chat_id, Outbound::Delete { key: event.key.clone() }, None)
            .await?;
        info!("Deleted group link from {} in {}", event.sender_id, chat_id);
        return Ok(GuardOutcome::Deleted);
    }

    warn!("Anti-link active in {} but bot is not admin", chat_id);
    let warning = Outbound::text(get_text(&state.config.locale, "guard.unenforceable"));
    state.transport.send(chat_id, warning, Some(&event.key)).await?;
    Ok(GuardOutcome::Unenforceable)
}
