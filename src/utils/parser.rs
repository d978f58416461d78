//! Command parser.
//!
//! Classifies normalized message text as either a command invocation or
//! free text. A command starts with one of the recognized prefix symbols;
//! `>` is a shorthand for the `eval` command.

/// Characters accepted as a command prefix.
pub const PREFIX_SYMBOLS: &str = "°•π÷×¶∆£¢€¥®™+✓_=|~!?@#$%^&.©^";

/// Shorthand prefix that always maps to the `eval` command.
pub const EVAL_PREFIX: char = '>';

/// A parsed command invocation.
///
/// `text` is always `args.join(" ")` and `command` is lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub prefix: char,
    pub command: String,
    pub args: Vec<String>,
    pub text: String,
}

/// Result of classifying a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Command(ParsedCommand),
    Text(String),
}

/// Classify a trimmed, non-empty message body.
pub fn parse_command(input: &str) -> Classified {
    let Some(first) = input.chars().next() else {
        return Classified::Text(String::new());
    };

    if first == EVAL_PREFIX {
        // Split on single spaces: consecutive spaces keep empty entries.
        let text = input[first.len_utf8()..].trim().to_string();
        let args = text.split(' ').map(str::to_string).collect();
        return Classified::Command(ParsedCommand {
            prefix: EVAL_PREFIX,
            command: "eval".to_string(),
            args,
            text,
        });
    }

    if !PREFIX_SYMBOLS.contains(first) {
        return Classified::Text(input.to_string());
    }

    let rest = input[first.len_utf8()..].trim_start();
    let mut tokens = rest.split_whitespace();
    let command = tokens.next().unwrap_or_default().to_lowercase();
    let args: Vec<String> = tokens.map(str::to_string).collect();
    let text = args.join(" ");

    Classified::Command(ParsedCommand {
        prefix: first,
        command,
        args,
        text,
    })
}
