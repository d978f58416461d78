//! AI responder integration: prompt building, trigger-tag parsing, and
//! the side-effect actions the tags request.

mod actions;
pub mod prompt;
mod triggers;

pub use actions::run_ai_turn;
pub use triggers::{AiTriggerResult, StickerParams, TriggerAction, parse_triggers};
