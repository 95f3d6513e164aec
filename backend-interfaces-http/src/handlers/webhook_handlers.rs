use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use backend_application::commands::ingest_commands;
use backend_application::{AppError, AppState};
use backend_domain::{InboundWebhook, IngestResult};

use crate::error::HttpError;
use crate::middleware::{client_ip, headers_to_json, parse_payload, resolve_source, verify_signature};

#[derive(Serialize)]
pub struct WebhookAccepted {
    pub success: bool,
    pub message: &'static str,
    #[serde(flatten)]
    pub result: IngestResult,
}

pub async fn receive_webhook(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAccepted>, HttpError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    accept(state, None, peer, headers, body).await
}

pub async fn receive_webhook_with_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAccepted>, HttpError> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    accept(state, Some(source), peer, headers, body).await
}

async fn accept(
    state: AppState,
    path_source: Option<String>,
    peer: Option<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAccepted>, HttpError> {
    let source = resolve_source(path_source, &headers);
    if !verify_signature(state.config.webhook_secret.as_deref(), &headers, &body) {
        warn!(source = %source, "webhook signature mismatch");
        return Err(HttpError::Unauthorized);
    }

    let parsed = parse_payload(&headers, &body, state.config.max_body_bytes);
    let (raw_payload, payload) = match parsed {
        Ok(parsed) => parsed,
        Err(err) => {
            state.metrics.record_malformed();
            warn!(source = %source, bytes = body.len(), "rejected malformed webhook: {}", err);
            return Err(AppError::MalformedPayload(err.to_string()).into());
        }
    };

    let inbound = InboundWebhook {
        source,
        client_ip: client_ip(&headers, peer),
        received_at: Utc::now(),
        raw_payload,
        headers: headers_to_json(&headers),
        payload,
    };
    let result = ingest_commands::process_webhook(&state, inbound).await;
    let message = if result.is_duplicate {
        "webhook recorded as duplicate"
    } else {
        "webhook recorded"
    };
    Ok(Json(WebhookAccepted {
        success: true,
        message,
        result,
    }))
}
