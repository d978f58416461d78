//! Message-level handlers that run ahead of command dispatch.

pub mod antilink;
pub mod static_commands;

pub use antilink::GuardOutcome;
