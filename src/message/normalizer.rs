//! Message Normalizer.
//!
//! Pulls the plain-text body and media attachments out of the nested
//! content union. Wrapper types (ephemeral, view-once) are unwrapped
//! exactly one level before the content is inspected again.

use serde::{Deserialize, Serialize};

use super::envelope::{ContentType, MediaMessage, MessageContent};

/// Kind of media attachment the bot can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A downloadable attachment: enough for the bridge to fetch the bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    /// Id of the message that carries the media.
    pub message_id: String,
    pub media: MediaMessage,
}

impl MediaRef {
    pub fn is_image(&self) -> bool {
        self.kind == MediaKind::Image
    }

    /// Duration in seconds, for videos.
    pub fn seconds(&self) -> Option<u32> {
        self.media.seconds
    }
}

/// The content after unwrapping one wrapper level, if any.
fn inspected(content: &MessageContent) -> &MessageContent {
    content.unwrapped().unwrap_or(content)
}

/// Best-effort plain-text body. Empty when no text-bearing type is found.
pub fn extract_text(content: &MessageContent) -> String {
    let content = inspected(content);

    let text = match content.content_type() {
        Some(ContentType::Conversation) => content.conversation.clone(),
        Some(ContentType::ExtendedText) => content
            .extended_text_message
            .as_ref()
            .and_then(|m| m.text.clone()),
        Some(ContentType::Image) => caption(content.image_message.as_ref()),
        Some(ContentType::Video) => caption(content.video_message.as_ref()),
        Some(ContentType::Document) => caption(content.document_message.as_ref()),
        _ => None,
    };

    text.unwrap_or_default()
}

fn caption(media: Option<&MediaMessage>) -> Option<String> {
    media.and_then(|m| m.caption.clone())
}

/// Image or video attachment of the message itself.
pub fn extract_media(content: &MessageContent, message_id: &str) -> Option<MediaRef> {
    let content = inspected(content);

    let (kind, media) = match (&content.image_message, &content.video_message) {
        (Some(image), _) => (MediaKind::Image, image),
        (None, Some(video)) => (MediaKind::Video, video),
        (None, None) => return None,
    };

    Some(MediaRef {
        kind,
        message_id: message_id.to_string(),
        media: media.clone(),
    })
}
