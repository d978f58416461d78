//! Built-in handler catalog.

use std::sync::Arc;

use super::Plugin;
use super::admin::{Demote, Promote};
use super::ai::Ai;
use super::antilink::AntiLink;
use super::edit::Edit;
use super::eval::Eval;
use super::menu::Menu;
use super::owner::Owner;
use super::ping::Ping;
use super::sticker::Sticker;
use super::tiktok::TikTok;

/// Every handler a manifest can name.
pub fn all() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(Ping),
        Arc::new(Menu),
        Arc::new(Owner),
        Arc::new(Ai),
        Arc::new(Promote),
        Arc::new(Demote),
        Arc::new(AntiLink),
        Arc::new(TikTok),
        Arc::new(Sticker),
        Arc::new(Edit),
        Arc::new(Eval),
    ]
}

/// Handler by manifest name.
pub fn builtin(name: &str) -> Option<Arc<dyn Plugin>> {
    let name = name.trim();
    all().into_iter().find(|plugin| plugin.name().eq_ignore_ascii_case(name))
}
