//! Normalized inbound event.

use super::envelope::{MessageKey, WebMessage};
use super::normalizer::{MediaRef, extract_media, extract_text};
use crate::transport::jid;

/// The message this one replies to.
#[derive(Debug, Clone, Default)]
pub struct QuotedMessage {
    /// Author of the quoted message.
    pub participant: Option<String>,
    pub media: Option<MediaRef>,
}

/// One normalized inbound message. Immutable once built.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat_id: String,
    pub sender_id: String,
    pub is_group: bool,
    pub display_name: String,
    /// Trimmed text body; may be empty for media-only messages.
    pub raw_text: String,
    pub media: Option<MediaRef>,
    pub quoted: Option<QuotedMessage>,
    pub mentions: Vec<String>,
    pub key: MessageKey,
}

impl InboundEvent {
    /// Normalize a transport message. `None` when it carries no content.
    pub fn from_message(msg: &WebMessage) -> Option<Self> {
        let content = msg.message.as_ref()?;
        let chat_id = msg.key.remote_jid.clone();
        let is_group = jid::is_group(&chat_id);
        let sender_id = msg
            .key
            .participant
            .clone()
            .filter(|_| is_group)
            .unwrap_or_else(|| chat_id.clone());

        let display_name = msg
            .push_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| msg.key.participant.as_deref().map(|p| jid::user_part(p).to_string()))
            .unwrap_or_else(|| "Unknown".to_string());

        let context = content
            .unwrapped()
            .and_then(|inner| inner.context_info())
            .or_else(|| content.context_info());

        let quoted = context.map(|ctx| QuotedMessage {
            participant: ctx.participant.clone(),
            media: ctx.quoted_message.as_deref().and_then(|q| {
                extract_media(q, ctx.stanza_id.as_deref().unwrap_or_default())
            }),
        });

        Some(Self {
            is_group,
            sender_id,
            display_name,
            raw_text: extract_text(content).trim().to_string(),
            media: extract_media(content, &msg.key.id),
            mentions: context.map(|c| c.mentioned_jid.clone()).unwrap_or_default(),
            quoted,
            key: msg.key.clone(),
            chat_id,
        })
    }

    /// Image attached to this message, or failing that to the quoted one.
    pub fn image_or_quoted(&self) -> Option<&MediaRef> {
        self.media
            .as_ref()
            .filter(|m| m.is_image())
            .or_else(|| self.quoted_media().filter(|m| m.is_image()))
    }

    /// Image or video on this message, or failing that on the quoted one.
    pub fn media_or_quoted(&self) -> Option<&MediaRef> {
        self.media.as_ref().or_else(|| self.quoted_media())
    }

    fn quoted_media(&self) -> Option<&MediaRef> {
        self.quoted.as_ref().and_then(|q| q.media.as_ref())
    }
}
