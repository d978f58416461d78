//! Bot runtime: webhook server receiving bridge events.
//!
//! The bridge POSTs JSON events to `/events`. Each message of an upsert
//! batch is dispatched on its own task, so one slow plugin never holds up
//! the rest of the chat traffic.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::AppState;
use super::pipeline::dispatch;
use crate::message::WebMessage;

/// Events delivered by the transport bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "event")]
pub enum BridgeEvent {
    #[serde(rename = "messages.upsert")]
    MessagesUpsert { messages: Vec<WebMessage> },

    #[serde(rename = "connection.update")]
    ConnectionUpdate {
        connection: String,
        #[serde(default)]
        reason: Option<String>,
    },

    #[serde(other)]
    Other,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(receive))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve until Ctrl-C or an owner-triggered shutdown.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.listen_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("📡 Listening for bridge events on {}", addr);

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down...");
            shutdown.trigger();
        }
    });

    let shutdown = state.shutdown.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    info!("Webhook server stopped");
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<BridgeEvent>,
) -> StatusCode {
    if !authorized(&headers, state.config.bridge_token.as_deref()) {
        warn!("Rejected bridge event with bad credentials");
        return StatusCode::UNAUTHORIZED;
    }

    match event {
        BridgeEvent::MessagesUpsert { messages } => {
            for msg in messages {
                let state = state.clone();
                tokio::spawn(async move {
                    let outcome = dispatch(&state, &msg).await;
                    debug!("Message {} -> {:?}", msg.key.id, outcome);
                });
            }
        }
        BridgeEvent::ConnectionUpdate { connection, reason } => match connection.as_str() {
            "open" => info!("✅ Connected to WhatsApp"),
            "close" => warn!(
                "Connection closed: {}",
                reason.as_deref().unwrap_or("unknown reason")
            ),
            other => debug!("Connection state: {}", other),
        },
        BridgeEvent::Other => debug!("Ignoring unsupported bridge event"),
    }

    StatusCode::ACCEPTED
}

/// With a token configured, the bridge must present it as a bearer token.
fn authorized(headers: &HeaderMap, token: Option<&str>) -> bool {
    let Some(token) = token else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|presented| presented == token)
}
