//! Group role management: promote and demote members.

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Plugin, PluginContext};
use crate::transport::{MembershipAction, Outbound, jid};

pub struct Promote;
pub struct Demote;

#[async_trait]
impl Plugin for Promote {
    fn name(&self) -> &'static str {
        "promote"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["promote"]
    }

    fn tag(&self) -> &'static str {
        "group"
    }

    fn help(&self) -> &'static str {
        "Make a member a group admin"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        change_role(ctx, MembershipAction::Promote).await
    }
}

#[async_trait]
impl Plugin for Demote {
    fn name(&self) -> &'static str {
        "demote"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["demote"]
    }

    fn tag(&self) -> &'static str {
        "group"
    }

    fn help(&self) -> &'static str {
        "Remove a group admin"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        change_role(ctx, MembershipAction::Demote).await
    }
}

/// Who the command is aimed at: the quoted author, then the first
/// mention, then a phone number argument.
fn resolve_target(ctx: &PluginContext) -> Option<String> {
    ctx.event
        .quoted
        .as_ref()
        .and_then(|q| q.participant.clone())
        .or_else(|| ctx.event.mentions.first().cloned())
        .or_else(|| ctx.args().first().and_then(|arg| jid::from_number(arg)))
}

async fn change_role(ctx: &PluginContext, action: MembershipAction) -> anyhow::Result<()> {
    let chat_id = &ctx.event.chat_id;
    let permissions = &ctx.state.permissions;

    if !ctx.event.is_group {
        return ctx.reply(ctx.t("common.group_only")).await;
    }
    if !permissions.is_admin(chat_id, &ctx.event.sender_id).await? {
        return ctx.reply(ctx.t("common.admin_only")).await;
    }
    if !permissions.bot_is_admin(chat_id).await? {
        return ctx.reply(ctx.t("common.bot_not_admin")).await;
    }

    let Some(target) = resolve_target(ctx) else {
        return ctx.reply(ctx.tf("admin.no_target", &[])).await;
    };
    if ctx.state.transport.identity().matches(&target) {
        return ctx.reply(ctx.t("admin.self")).await;
    }

    let result = ctx
        .state
        .transport
        .group_participants_update(chat_id, std::slice::from_ref(&target), action)
        .await;

    if let Err(e) = result {
        warn!("{:?} of {} in {} failed: {}", action, target, chat_id, e);
        return ctx.reply(ctx.tf("admin.failed", &[("error", &e.to_string())])).await;
    }

    permissions.invalidate(chat_id);
    info!("{:?} {} in {}", action, target, chat_id);

    let key = match action {
        MembershipAction::Promote => "admin.promoted",
        MembershipAction::Demote => "admin.demoted",
    };
    let text = ctx.tf(key, &[("user", jid::user_part(&target))]);
    ctx.send(Outbound::Text {
        text,
        mentions: vec![target],
    })
    .await
}
