//! Utility functions.
//!
//! Collection of helpers used across the bot.

pub mod parser;
pub mod retry;

pub use parser::{Classified, ParsedCommand, parse_command};
pub use retry::RetryPolicy;

/// Truncate to at most `max` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
