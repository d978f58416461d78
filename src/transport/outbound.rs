//! Outbound message model and group metadata shapes.

use serde::{Deserialize, Serialize};

use crate::message::{MediaRef, MessageKey};

/// Where the bytes of an outbound media message come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaSource {
    /// Remote URL fetched by the bridge.
    Url { url: String },
    /// Media attached to an inbound message.
    Message { media: MediaRef },
}

impl MediaSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }
}

/// One message to send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        mentions: Vec<String>,
    },
    Image {
        source: MediaSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Audio {
        source: MediaSource,
        mimetype: String,
    },
    Video {
        source: MediaSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    /// Converted to WebP sticker format by the bridge.
    Sticker {
        source: MediaSource,
        pack: String,
        author: String,
    },
    Contact {
        display_name: String,
        vcard: String,
    },
    React {
        key: MessageKey,
        emoji: String,
    },
    Delete {
        key: MessageKey,
    },
}

impl Outbound {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            mentions: Vec::new(),
        }
    }

    pub fn react(key: &MessageKey, emoji: &str) -> Self {
        Self::React {
            key: key.clone(),
            emoji: emoji.to_string(),
        }
    }

    /// Text body, if this is a text message.
    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Presence (typing indicator) states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Available,
    Composing,
    Paused,
}

/// The bot's own account addresses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: String,
    #[serde(default)]
    pub lid: Option<String>,
}

impl BotIdentity {
    /// Whether `jid` names the bot under either of its identities.
    pub fn matches(&self, jid: &str) -> bool {
        let jid = super::normalize_jid(jid);
        super::normalize_jid(&self.id) == jid
            || self
                .lid
                .as_deref()
                .is_some_and(|lid| super::normalize_jid(lid) == jid)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupParticipant {
    pub id: String,
    /// `"admin"`, `"superadmin"`, or absent for members.
    #[serde(default)]
    pub admin: Option<String>,
}

impl GroupParticipant {
    pub fn is_admin(&self) -> bool {
        self.admin.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub participants: Vec<GroupParticipant>,
}

impl GroupMetadata {
    /// Participant entry for `jid`, compared in canonical form.
    pub fn participant(&self, jid: &str) -> Option<&GroupParticipant> {
        let jid = super::normalize_jid(jid);
        self.participants
            .iter()
            .find(|p| super::normalize_jid(&p.id) == jid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipAction {
    Promote,
    Demote,
}
