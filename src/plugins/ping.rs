//! Ping command plugin.
//!
//! Measures and displays bridge latency.

use std::time::Instant;

use async_trait::async_trait;

use super::{Plugin, PluginContext};
use crate::transport::Presence;

pub struct Ping;

#[async_trait]
impl Plugin for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["ping", "p"]
    }

    fn tag(&self) -> &'static str {
        "main"
    }

    fn help(&self) -> &'static str {
        "Check bot latency"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        // Presence update is the lightest round trip the bridge offers
        let start = Instant::now();
        let _ = ctx
            .state
            .transport
            .presence_update(&ctx.event.chat_id, Presence::Available)
            .await;
        let ms = start.elapsed().as_millis();

        let text = format!("{} {}", latency_emoji(ms), ctx.tf("ping.pong", &[("ms", &ms.to_string())]));
        ctx.reply(text).await
    }
}

fn latency_emoji(ms: u128) -> &'static str {
    if ms < 100 {
        "🟢"
    } else if ms < 300 {
        "🟡"
    } else {
        "🔴"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[test]
    fn test_latency_emoji() {
        assert_eq!(latency_emoji(20), "🟢");
        assert_eq!(latency_emoji(150), "🟡");
        assert_eq!(latency_emoji(900), "🔴");
    }

    #[tokio::test]
    async fn test_ping_replies_with_latency() {
        let harness = Harness::new();
        let ctx = harness.context("62811@s.whatsapp.net", ".ping");

        Ping.run(&ctx).await.unwrap();

        let texts = harness.transport.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Pong!"));
        assert!(texts[0].contains("ms"));
    }
}
