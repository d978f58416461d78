//! Owner contact card.

use async_trait::async_trait;

use super::{Plugin, PluginContext};
use crate::transport::Outbound;

pub struct Owner;

#[async_trait]
impl Plugin for Owner {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["owner", "creator"]
    }

    fn tag(&self) -> &'static str {
        "main"
    }

    fn help(&self) -> &'static str {
        "Contact the bot owner"
    }

    async fn run(&self, ctx: &PluginContext) -> anyhow::Result<()> {
        let config = &ctx.state.config;
        ctx.send(Outbound::Contact {
            display_name: config.owner_name.clone(),
            vcard: vcard(&config.owner_name, &config.owner_number),
        })
        .await
    }
}

fn vcard(name: &str, number: &str) -> String {
    format!(
        "BEGIN:VCARD\nVERSION:3.0\nFN:{name}\nORG:Owner;\nTEL;type=CELL;type=VOICE;waid={number}:+{number}\nEND:VCARD"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[test]
    fn test_vcard_carries_whatsapp_id() {
        let card = vcard("Rin", "62811");
        assert!(card.starts_with("BEGIN:VCARD"));
        assert!(card.contains("FN:Rin"));
        assert!(card.contains("waid=62811:+62811"));
    }

    #[tokio::test]
    async fn test_sends_contact() {
        let harness = Harness::new();
        let ctx = harness.context("62899@s.whatsapp.net", ".owner");

        Owner.run(&ctx).await.unwrap();

        let sent = harness.transport.sent();
        assert!(matches!(&sent[0].1, Outbound::Contact { vcard, .. } if vcard.contains("62811")));
    }
}
