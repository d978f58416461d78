//! Owner-only maintenance operations.
//!
//! Instead of evaluating arbitrary code this exposes a fixed set of
//! operations, reachable as `.eval <op>` or the `>op` shorthand.

use std::fmt::Write;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Plugin, PluginContext};

pub struct Eval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Status,
    Plugins,
    Reload,
    Whoami,
    Cache,
    Shutdown,
}

impl Operation {
    const ALL: [(&'static str, Operation); 6] = [
        ("status", Operation::Status),
        ("plugins", Operation::Plugins),
        ("reload", Operation::Reload),
        ("whoami", Operation::Whoami),
        ("cache", Operation::Cache),
        ("shutdown", Operation::Shutdown),
    ];

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        Self::ALL.iter().find(|(name, _)| *name == raw).map(|(_, op)| *op)
    }

    fn names() -> String {
        Self::ALL.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
    }
}

#[async_trait]
impl Plugin for Eval {
    fn name(&self) -> &'static str {
        "eval"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["eval"]
    }

    fn tag(&self) -> &'static str {
        "owner"
    }

    fn help(&self) -> &'static str {
        "Owner maintenance operations"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        let sender = &ctx.event.sender_id;
        if !ctx.state.permissions.is_owner(sender) {
            warn!("Eval denied for {}", sender);
            return ctx.reply(ctx.tf("eval.denied", &[("sender", sender)])).await;
        }

        let ops = Operation::names();
        let raw = ctx.args().first().map(String::as_str).unwrap_or_default();
        if raw.trim().is_empty() {
            return ctx.reply(ctx.tf("eval.usage", &[("ops", &ops)])).await;
        }
        let Some(op) = Operation::parse(raw) else {
            return ctx.reply(ctx.tf("eval.unknown", &[("op", raw), ("ops", &ops)])).await;
        };

        info!("Eval {:?} by {}", op, sender);
        match op {
            Operation::Status => ctx.reply(status(ctx)).await,
            Operation::Plugins => ctx.reply(plugin_list(ctx)).await,
            Operation::Reload => match ctx.state.plugins.load() {
                Ok(count) => {
                    ctx.reply(ctx.tf("eval.reloaded", &[("count", &count.to_string())]))
                        .await
                }
                Err(e) => {
                    ctx.reply(ctx.tf("eval.reload_failed", &[("error", &e.to_string())]))
                        .await
                }
            },
            Operation::Whoami => ctx.reply(whoami(ctx)).await,
            Operation::Cache => {
                if ctx.args().get(1).is_some_and(|a| a.eq_ignore_ascii_case("clear")) {
                    ctx.state.cache.clear_all();
                    return ctx.reply(ctx.t("eval.cache_cleared")).await;
                }
                ctx.reply(cache_stats(ctx)).await
            }
            Operation::Shutdown => {
                ctx.reply(ctx.t("eval.shutdown")).await?;
                ctx.state.shutdown.trigger();
                Ok(())
            }
        }
    }
}

fn status(ctx: &PluginContext) -> String {
    let uptime = ctx.state.started_at.elapsed().as_secs();
    let identity = ctx.state.transport.identity();
    format!(
        "🤖 *{}*\nUptime: {}h {}m {}s\nCommands: {}\nBot ID: {}",
        ctx.state.config.bot_name,
        uptime / 3600,
        uptime % 3600 / 60,
        uptime % 60,
        ctx.state.plugins.len(),
        identity.id,
    )
}

fn plugin_list(ctx: &PluginContext) -> String {
    let mut out = format!("🧩 *Plugins* ({})\n", ctx.state.plugins.dir().display());
    for descriptor in ctx.state.plugins.list() {
        let _ = writeln!(
            out,
            "◦ {} [{}] {} ({})",
            descriptor.handler.name(),
            descriptor.tag,
            descriptor.commands.join(", "),
            descriptor.source.display(),
        );
    }
    out
}

fn whoami(ctx: &PluginContext) -> String {
    let event = &ctx.event;
    format!(
        "👤 Sender: {}\n💬 Chat: {}\nGroup: {}\nOwner: yes",
        event.sender_id, event.chat_id, event.is_group
    )
}

fn cache_stats(ctx: &PluginContext) -> String {
    let mut out = String::from("📦 *Caches*\n");
    for (name, entries) in ctx.state.cache.stats() {
        let _ = writeln!(out, "◦ {}: {}", name, entries);
    }
    out
}
