//! Transport collaborator.
//!
//! The messaging protocol itself lives in an external WhatsApp bridge
//! process. `Transport` is everything the bot asks of it; the bridge pushes
//! inbound events to our webhook (see `bot::runtime`).

mod bridge;
pub mod jid;
mod outbound;

use async_trait::async_trait;

use crate::message::{MediaRef, MessageKey};

pub use bridge::BridgeTransport;
pub use jid::{STATUS_BROADCAST, normalize_jid};
pub use outbound::{
    BotIdentity, GroupMetadata, GroupParticipant, MediaSource, MembershipAction, Outbound,
    Presence,
};

/// Errors raised by the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("bridge request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid bridge url: {0}")]
    Url(#[from] url::ParseError),

    #[error("bridge rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Messaging operations used by the bot.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The bot's own addresses.
    fn identity(&self) -> &BotIdentity;

    /// Send a message, optionally quoting an inbound one.
    async fn send(
        &self,
        chat_id: &str,
        message: Outbound,
        quoted: Option<&MessageKey>,
    ) -> Result<(), TransportError>;

    /// Mark messages as read.
    async fn read_messages(&self, keys: &[MessageKey]) -> Result<(), TransportError>;

    async fn presence_update(&self, chat_id: &str, presence: Presence)
    -> Result<(), TransportError>;

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, TransportError>;

    async fn group_participants_update(
        &self,
        group_id: &str,
        participants: &[String],
        action: MembershipAction,
    ) -> Result<(), TransportError>;

    /// Raw bytes of an inbound attachment.
    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, TransportError>;
}
