//! Bare-word commands answered before prefix parsing.

use crate::bot::AppState;
use crate::i18n::format_text;
use crate::message::InboundEvent;
use crate::transport::Outbound;

/// Static reply for a bare word, if it is one.
pub fn static_reply(state: &AppState, text: &str) -> Option<String> {
    let locale = &state.config.locale;
    match text.trim().to_lowercase().as_str() {
        "help" | "bantuan" | "menu" => Some(format_text(
            locale,
            "static.help",
            &[("bot", &state.config.bot_name), ("footer", &state.config.footer)],
        )),
        "ping" => Some(format_text(locale, "static.pong", &[])),
        _ => None,
    }
}

/// Answer a static command. Returns whether the event was consumed.
pub async fn handle(state: &AppState, event: &InboundEvent) -> anyhow::Result<bool> {
    let Some(reply) = static_reply(state, &event.raw_text) else {
        return Ok(false);
    };
    state
        .transport
        .send(&event.chat_id, Outbound::text(reply), Some(&event.key))
        .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::get_text;
    use crate::test_support::Harness;

    #[test]
    fn test_bare_words() {
        let harness = Harness::new();
        let help = static_reply(&harness.state, "Bantuan").unwrap();
        assert!(help.contains(&harness.state.config.bot_name));
        assert!(help.contains(&harness.state.config.footer));
        assert_eq!(static_reply(&harness.state, " ping "), Some(get_text("id", "static.pong")));
    }

    #[test]
    fn test_prefixed_and_other_text_fall_through() {
        let harness = Harness::new();
        assert_eq!(static_reply(&harness.state, ".ping"), None);
        assert_eq!(static_reply(&harness.state, "ping me later"), None);
        assert_eq!(static_reply(&harness.state, "halo"), None);
    }
}
