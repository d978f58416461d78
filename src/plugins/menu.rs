//! Menu command plugin.
//!
//! Lists every active command grouped by its category tag.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{Plugin, PluginContext, PluginDescriptor};

pub struct Menu;

#[async_trait]
impl Plugin for Menu {
    fn name(&self) -> &'static str {
        "menu"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["menu", "help"]
    }

    fn tag(&self) -> &'static str {
        "main"
    }

    fn help(&self) -> &'static str {
        "Show the command list"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        let time = chrono::Local::now().format("%H:%M").to_string();
        let prefix = ctx.prefix().to_string();

        let header = [
            format!("*{}*", ctx.state.config.bot_name),
            ctx.tf("menu.greeting", &[("name", &ctx.event.display_name)]),
            ctx.tf("menu.time", &[("time", &time)]),
            ctx.tf("menu.prefix", &[]),
        ]
        .join("\n");

        let body = render_sections(&ctx.state.plugins.list(), &prefix);
        let text = format!("{}\n\n{}\n_{}_", header, body, ctx.state.config.footer);
        ctx.reply(text).await
    }
}

/// Command list grouped by tag, tags and commands sorted.
fn render_sections(descriptors: &[std::sync::Arc<PluginDescriptor>], prefix: &str) -> String {
    let mut sections: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for descriptor in descriptors {
        let commands = sections.entry(descriptor.tag.as_str()).or_default();
        commands.extend(descriptor.commands.iter().map(String::as_str));
    }

    let mut out = String::new();
    for (tag, mut commands) in sections {
        commands.sort_unstable();
        commands.dedup();

        out.push_str(&format!("┌──「 *{}* 」\n", tag.to_uppercase()));
        for command in commands {
            out.push_str(&format!("│ ◦ {}{}\n", prefix, command));
        }
        out.push_str("└────\n\n");
    }
    out
}
