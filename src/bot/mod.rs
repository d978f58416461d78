//! Bot module - Core bot functionality.

pub mod dispatcher;
pub mod pipeline;
mod runtime;

pub use dispatcher::AppState;
pub use runtime::run;
