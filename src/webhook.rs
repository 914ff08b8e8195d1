//! HTTP listener for TradingView-style alert webhooks.
//!
//! `POST /webhook` decodes a JSON alert and forwards it to the configured
//! alert chat; `GET /` is a liveness probe.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::messenger::Messenger;

/// Alert payload. Omitted fields decode to empty/zero values.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TradingViewAlert {
    pub strategy_name: String,
    pub ticker: String,
    pub price: f64,
    pub message: String,
}

impl TradingViewAlert {
    pub fn render(&self) -> String {
        format!(
            "TradingView alert\nStrategy: {}\nTicker: {}\nPrice: {}\nMessage: {}",
            self.strategy_name, self.ticker, self.price, self.message
        )
    }
}

/// Decode an alert body. Only a JSON object is accepted; serde would
/// otherwise also read a positional array into the struct.
pub fn decode_alert(body: &[u8]) -> Result<TradingViewAlert> {
    let object: Map<String, Value> =
        serde_json::from_slice(body).context("Alert body is not a JSON object")?;
    serde_json::from_value(Value::Object(object)).context("Alert fields have the wrong types")
}

#[derive(Clone)]
pub struct WebhookState {
    messenger: Messenger,
    alert_chat_id: i64,
}

impl WebhookState {
    pub fn new(messenger: Messenger, alert_chat_id: i64) -> Self {
        Self {
            messenger,
            alert_chat_id,
        }
    }
}

async fn liveness() -> &'static str {
    "Server is running"
}

async fn webhook(State(state): State<WebhookState>, body: Bytes) -> (StatusCode, &'static str) {
    info!("Received webhook payload: {}", String::from_utf8_lossy(&body));

    let alert = match decode_alert(&body) {
        Ok(alert) => alert,
        Err(e) => {
            warn!("Rejecting webhook payload: {:#}", e);
            return (StatusCode::BAD_REQUEST, "Invalid alert payload");
        }
    };

    let delivered = state
        .messenger
        .send(state.alert_chat_id, &alert.render())
        .await;
    if delivered == 0 {
        warn!("Alert for {} was not delivered to chat {}", alert.ticker, state.alert_chat_id);
    }

    (StatusCode::OK, "Alert forwarded")
}

/// Build the axum router with shared state.
pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/webhook", post(webhook))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

/// Bind `addr` and serve until the listener fails.
pub async fn serve(addr: &str, state: WebhookState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind webhook listener to {}", addr))?;

    info!("Webhook listener on {}", addr);

    axum::serve(listener, build_router(state))
        .await
        .context("Webhook server error")?;
    Ok(())
}
