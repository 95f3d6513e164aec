use backend_domain::utils::normalize_optional_text;
use backend_domain::{AlertEvent, Classification, DeliveryReport, DeliveryRequest, EventId};
use tracing::{error, info, warn};

use crate::classify::classify_or_fallback;
use crate::{AppError, AppState};

pub async fn reanalyze_event(state: &AppState, id: EventId) -> Result<Classification, AppError> {
    let event = load_event(state, id).await?;
    let classification = classify_or_fallback(state, &event.parsed_payload, &event.source).await;
    state
        .event_repo
        .update_classification(id, &classification)
        .await
        .map_err(|err| {
            error!(event_id = id, "failed to store classification: {}", err);
            AppError::Internal(err)
        })?;
    info!(
        event_id = id,
        importance = classification.importance.as_str(),
        "event reanalyzed"
    );
    Ok(classification)
}

/// Operator-triggered delivery. Bypasses the forwarding gate; `target`
/// overrides the configured forward URL.
pub async fn forward_event(
    state: &AppState,
    id: EventId,
    target: Option<String>,
) -> Result<DeliveryReport, AppError> {
    let target = normalize_optional_text(target);
    if let Some(url) = &target {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::BadRequest(
                "forward_url must start with http:// or https://".to_string(),
            ));
        }
    } else if state.config.forward_url.is_none() {
        return Err(AppError::BadRequest(
            "no forward_url given and none configured".to_string(),
        ));
    }

    let event = load_event(state, id).await?;
    let request = DeliveryRequest {
        source: event.source.clone(),
        received_at: event.received_at,
        client_ip: event.client_ip.clone(),
        payload: event.parsed_payload.clone(),
        classification: event.classification.clone().unwrap_or_default(),
    };
    let report = state.notifier.deliver(&request, target.as_deref()).await;
    state.metrics.record_forward(report.status);

    if let Err(err) = state
        .event_repo
        .update_forward_status(id, report.status)
        .await
    {
        warn!(event_id = id, "failed to record forward status: {}", err);
    }
    Ok(report)
}

async fn load_event(state: &AppState, id: EventId) -> Result<AlertEvent, AppError> {
    state
        .event_repo
        .get_event(id)
        .await
        .map_err(|err| {
            error!(event_id = id, "failed to load event: {}", err);
            AppError::Internal(err)
        })?
        .ok_or(AppError::NotFound)
}
