//! Database model exports.

pub mod history;

pub use history::{HistoryEntry, Role};
