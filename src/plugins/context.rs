//! Per-invocation context handed to plugins.

use tracing::warn;

use crate::bot::AppState;
use crate::i18n::{format_text, get_text};
use crate::message::InboundEvent;
use crate::transport::Outbound;
use crate::utils::ParsedCommand;

/// Everything a plugin needs for one command invocation.
///
/// Replies always quote the triggering message.
pub struct PluginContext {
    pub state: AppState,
    pub event: InboundEvent,
    pub command: ParsedCommand,
}

impl PluginContext {
    pub fn new(state: AppState, event: InboundEvent, command: ParsedCommand) -> Self {
        Self {
            state,
            event,
            command,
        }
    }

    pub fn args(&self) -> &[String] {
        &self.command.args
    }

    /// Arguments joined with single spaces.
    pub fn text(&self) -> &str {
        &self.command.text
    }

    pub fn prefix(&self) -> char {
        self.command.prefix
    }

    /// The (lowercased) command name that was invoked.
    pub fn command_name(&self) -> &str {
        &self.command.command
    }

    pub fn locale(&self) -> &str {
        &self.state.config.locale
    }

    /// Localized text.
    pub fn t(&self, key: &str) -> String {
        get_text(self.locale(), key)
    }

    /// Localized text with `{prefix}` and `{command}` filled in, plus `args`.
    pub fn tf(&self, key: &str, args: &[(&str, &str)]) -> String {
        let prefix = self.prefix().to_string();
        let mut all = vec![("prefix", prefix.as_str()), ("command", self.command_name())];
        all.extend_from_slice(args);
        format_text(self.locale(), key, &all)
    }

    /// Send a message to the originating chat, quoting the trigger.
    pub async fn send(&self, message: Outbound) -> anyhow::Result<()> {
        self.state
            .transport
            .send(&self.event.chat_id, message, Some(&self.event.key))
            .await?;
        Ok(())
    }

    pub async fn reply(&self, text: impl Into<String>) -> anyhow::Result<()> {
        self.send(Outbound::text(text)).await
    }

    /// React to the triggering message. Failures are logged only.
    pub async fn react(&self, emoji: &str) {
        let reaction = Outbound::react(&self.event.key, emoji);
        if let Err(e) = self.state.transport.send(&self.event.chat_id, reaction, None).await {
            warn!("Failed to react in {}: {}", self.event.chat_id, e);
        }
    }
}
