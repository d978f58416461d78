//! Plugin system for command handlers.
//!
//! Handlers are Rust types implementing [`Plugin`]. Which commands reach
//! which handler is decided at runtime by TOML manifests in the plugin
//! directory (see [`manifest`]), so commands can be renamed, aliased or
//! disabled and then hot-reloaded without a rebuild.
//!
//! Add a new handler by:
//! 1. Creating a new file in this directory with a type implementing `Plugin`
//! 2. Adding `mod your_plugin;` below
//! 3. Listing it in `catalog::all()`
//! 4. Dropping a manifest that names it into the plugin directory

mod admin;
mod ai;
mod antilink;
mod catalog;
mod context;
mod edit;
mod eval;
pub mod manifest;
mod menu;
mod owner;
mod ping;
mod registry;
mod sticker;
mod tiktok;

use async_trait::async_trait;

pub use context::PluginContext;
pub use manifest::PluginDescriptor;
pub use registry::PluginRegistry;
pub(crate) use sticker::{MAX_VIDEO_SECONDS as MAX_STICKER_SECONDS, too_long as sticker_too_long};
pub(crate) use tiktok::caption as tiktok_caption;

/// A command handler.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Identifier manifests use to refer to this handler.
    fn name(&self) -> &'static str;

    /// Command names used when a manifest does not list any.
    fn commands(&self) -> &'static [&'static str];

    /// Menu category.
    fn tag(&self) -> &'static str {
        "others"
    }

    fn help(&self) -> &'static str {
        ""
    }

    /// Handle one invocation. An error is retried by the pipeline and
    /// finally reported to the chat.
    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()>;
}
