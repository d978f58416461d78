//! Inbound message envelope as delivered by the transport bridge.
//!
//! Mirrors the WhatsApp Web message JSON shape (camelCase keys). Only the
//! fields the bot reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Addressing information of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    pub remote_jid: String,
    #[serde(default)]
    pub from_me: bool,
    pub id: String,
    /// Sender inside a group chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
}

/// One inbound message with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebMessage {
    pub key: MessageKey,
    #[serde(default)]
    pub message: Option<MessageContent>,
    #[serde(default)]
    pub push_name: Option<String>,
}

/// The content union. Exactly one field is normally present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    pub conversation: Option<String>,
    pub extended_text_message: Option<TextMessage>,
    pub image_message: Option<MediaMessage>,
    pub video_message: Option<MediaMessage>,
    pub document_message: Option<MediaMessage>,
    pub audio_message: Option<MediaMessage>,
    pub sticker_message: Option<MediaMessage>,
    pub ephemeral_message: Option<Box<WrappedMessage>>,
    pub view_once_message: Option<Box<WrappedMessage>>,
    pub view_once_message_v2: Option<Box<WrappedMessage>>,
    pub reaction_message: Option<Value>,
    pub protocol_message: Option<Value>,
}

/// Wrapper types (ephemeral, view-once) carry a nested message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WrappedMessage {
    pub message: Option<MessageContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessage {
    pub text: Option<String>,
    pub context_info: Option<ContextInfo>,
}

/// Image, video, document, audio or sticker payload.
///
/// Download fields (media key, direct path, ...) are kept opaque in
/// `extra` and handed back to the bridge untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    /// Duration for video/audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    #[serde(default, skip_serializing)]
    pub context_info: Option<ContextInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reply/mention metadata attached to text and media messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfo {
    pub stanza_id: Option<String>,
    /// Author of the quoted message.
    pub participant: Option<String>,
    #[serde(default)]
    pub mentioned_jid: Vec<String>,
    pub quoted_message: Option<Box<MessageContent>>,
}

/// Discriminant of `MessageContent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Ephemeral,
    ViewOnce,
    ViewOnceV2,
    Conversation,
    ExtendedText,
    Image,
    Video,
    Document,
    Audio,
    Sticker,
    Reaction,
    Protocol,
}

impl MessageContent {
    /// The content type, wrappers first.
    pub fn content_type(&self) -> Option<ContentType> {
        let present = [
            (self.ephemeral_message.is_some(), ContentType::Ephemeral),
            (self.view_once_message.is_some(), ContentType::ViewOnce),
            (self.view_once_message_v2.is_some(), ContentType::ViewOnceV2),
            (self.conversation.is_some(), ContentType::Conversation),
            (self.extended_text_message.is_some(), ContentType::ExtendedText),
            (self.image_message.is_some(), ContentType::Image),
            (self.video_message.is_some(), ContentType::Video),
            (self.document_message.is_some(), ContentType::Document),
            (self.audio_message.is_some(), ContentType::Audio),
            (self.sticker_message.is_some(), ContentType::Sticker),
            (self.reaction_message.is_some(), ContentType::Reaction),
            (self.protocol_message.is_some(), ContentType::Protocol),
        ];
        present.into_iter().find(|(is, _)| *is).map(|(_, ty)| ty)
    }

    /// The message nested inside a wrapper type, if this is one.
    pub fn unwrapped(&self) -> Option<&MessageContent> {
        let wrapper = match self.content_type()? {
            ContentType::Ephemeral => self.ephemeral_message.as_deref(),
            ContentType::ViewOnce => self.view_once_message.as_deref(),
            ContentType::ViewOnceV2 => self.view_once_message_v2.as_deref(),
            _ => None,
        }?;
        wrapper.message.as_ref()
    }

    /// Reply/mention metadata of the primary payload.
    pub fn context_info(&self) -> Option<&ContextInfo> {
        self.extended_text_message
            .as_ref()
            .and_then(|m| m.context_info.as_ref())
            .or_else(|| self.image_message.as_ref().and_then(|m| m.context_info.as_ref()))
            .or_else(|| self.video_message.as_ref().and_then(|m| m.context_info.as_ref()))
            .or_else(|| self.document_message.as_ref().and_then(|m| m.context_info.as_ref()))
    }
}
