use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use backend_application::commands::event_commands;
use backend_application::queries::event_queries;
use backend_application::AppState;
use backend_domain::{
    AlertEvent, Classification, DeliveryReport, EventId, EventPage, EventPageQuery, ForwardStatus,
};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(Deserialize)]
pub struct ForwardBody {
    pub forward_url: Option<String>,
}

#[derive(Serialize)]
pub struct ReanalyzeResponse {
    pub success: bool,
    pub classification: Classification,
}

#[derive(Serialize)]
pub struct ForwardResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: DeliveryReport,
}

pub async fn list_webhooks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<EventPageQuery>,
) -> Result<Json<EventPage>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let page = event_queries::list_events(&state, query).await?;
    Ok(Json(page))
}

pub async fn get_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EventId>,
) -> Result<Json<AlertEvent>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let event = event_queries::get_event(&state, id).await?;
    Ok(Json(event))
}

pub async fn reanalyze_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EventId>,
) -> Result<Json<ReanalyzeResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let classification = event_commands::reanalyze_event(&state, id).await?;
    Ok(Json(ReanalyzeResponse {
        success: true,
        classification,
    }))
}

pub async fn forward_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<EventId>,
    body: Option<Json<ForwardBody>>,
) -> Result<Json<ForwardResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let target = body.and_then(|Json(body)| body.forward_url);
    let report = event_commands::forward_event(&state, id, target).await?;
    Ok(Json(ForwardResponse {
        success: report.status == ForwardStatus::Delivered,
        report,
    }))
}
