use std::future::Future;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{timeout, Duration};
use tracing::error;

use backend_application::commands::config_commands;
use backend_application::queries::config_queries;
use backend_application::AppState;
use backend_domain::{ConfigView, DedupSettings, DedupSettingsUpdate};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(Serialize)]
pub struct LiveStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ReadyStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub forward_target: &'static str,
}

pub async fn health_live() -> Json<LiveStatus> {
    Json(LiveStatus {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

pub async fn health_ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyStatus>) {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let database = timed_check("database", timeout_secs, state.health.check_database()).await;
    let forward_target =
        timed_check("forward target", timeout_secs, state.health.check_forward_target()).await;

    let ready = database == "ok" && forward_target == "ok";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadyStatus {
            status: if ready { "ready" } else { "degraded" },
            database,
            forward_target,
        }),
    )
}

async fn timed_check(
    name: &str,
    timeout_secs: u64,
    check: impl Future<Output = anyhow::Result<bool>>,
) -> &'static str {
    match timeout(Duration::from_secs(timeout_secs), check).await {
        Ok(Ok(true)) => "ok",
        Ok(Ok(false)) => "error",
        Ok(Err(err)) => {
            error!("{} ready check failed: {}", name, err);
            "error"
        }
        Err(_) => {
            error!("{} ready check timeout after {}s", name, timeout_secs);
            "timeout"
        }
    }
}

pub async fn get_config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConfigView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(config_queries::get_config_view(&state).await))
}

pub async fn update_dedup_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<DedupSettingsUpdate>,
) -> Result<Json<DedupSettings>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let settings = config_commands::update_dedup_settings(&state, payload).await?;
    Ok(Json(settings))
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
