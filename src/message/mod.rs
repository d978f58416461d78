//! Inbound message model and normalization.

pub mod envelope;
mod event;
pub mod normalizer;

pub use envelope::{MessageKey, WebMessage};
pub use event::InboundEvent;
pub use normalizer::{MediaKind, MediaRef};
