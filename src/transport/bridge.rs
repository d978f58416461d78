//! HTTP client for the WhatsApp bridge.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use super::{
    BotIdentity, GroupMetadata, MembershipAction, Outbound, Presence, Transport, TransportError,
};
use crate::message::{MediaRef, MessageKey};

/// `Transport` backed by the bridge's REST API.
#[derive(Debug, Clone)]
pub struct BridgeTransport {
    client: Client,
    base: Url,
    token: Option<String>,
    identity: BotIdentity,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendBody<'a> {
    chat_id: &'a str,
    message: Outbound,
    #[serde(skip_serializing_if = "Option::is_none")]
    quoted: Option<&'a MessageKey>,
}

impl BridgeTransport {
    /// Connect to the bridge and fetch the bot's identity.
    pub async fn connect(base: Url, token: Option<String>) -> Result<Self, TransportError> {
        let mut transport = Self {
            client: Client::new(),
            base,
            token,
            identity: BotIdentity::default(),
        };

        let url = transport.base.join("me")?;
        let response = transport.check(transport.authorize(transport.client.get(url))).await?;
        transport.identity = response.json().await?;

        info!(
            "Bridge connected as {} (lid: {})",
            transport.identity.id,
            transport.identity.lid.as_deref().unwrap_or("-")
        );
        Ok(transport)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, TransportError> {
        let url = self.base.join(path)?;
        debug!("POST {}", url);
        self.check(self.authorize(self.client.post(url).json(body))).await
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    async fn send(
        &self,
        chat_id: &str,
        message: Outbound,
        quoted: Option<&MessageKey>,
    ) -> Result<(), TransportError> {
        let body = SendBody {
            chat_id,
            message,
            quoted,
        };
        self.post("messages/send", &body).await?;
        Ok(())
    }

    async fn read_messages(&self, keys: &[MessageKey]) -> Result<(), TransportError> {
        self.post("messages/read", &json!({ "keys": keys })).await?;
        Ok(())
    }

    async fn presence_update(
        &self,
        chat_id: &str,
        presence: Presence,
    ) -> Result<(), TransportError> {
        self.post("presence", &json!({ "chatId": chat_id, "presence": presence }))
            .await?;
        Ok(())
    }

    async fn group_metadata(&self, group_id: &str) -> Result<GroupMetadata, TransportError> {
        let url = self.base.join(&format!("groups/{}", group_id))?;
        let response = self.check(self.authorize(self.client.get(url))).await?;
        Ok(response.json().await?)
    }

    async fn group_participants_update(
        &self,
        group_id: &str,
        participants: &[String],
        action: MembershipAction,
    ) -> Result<(), TransportError> {
        self.post(
            &format!("groups/{}/participants", group_id),
            &json!({ "participants": participants, "action": action }),
        )
        .await?;
        Ok(())
    }

    async fn download_media(&self, media: &MediaRef) -> Result<Vec<u8>, TransportError> {
        let response = self.post("media/download", media).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
