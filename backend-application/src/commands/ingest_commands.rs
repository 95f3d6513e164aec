use backend_domain::services::{fingerprint, forwarding_gate, rule_classifier};
use backend_domain::{
    Classification, DeliveryRequest, ForwardStatus, InboundWebhook, IngestResult, NewAlertEvent,
    Profile, StorageStatus,
};
use tracing::{debug, info, warn};

use crate::classify::classify_or_fallback;
use crate::dedup::{recorder, resolver, DuplicateDecision};
use crate::AppState;

/// Runs one accepted webhook through fingerprinting, duplicate resolution,
/// classification, recording and forwarding. Always yields an event id.
pub async fn process_webhook(state: &AppState, inbound: InboundWebhook) -> IngestResult {
    state.metrics.record_received();
    let settings = state.dedup_settings().await;

    let (fingerprint, extraction) = fingerprint::fingerprint(&inbound.payload, &inbound.source);
    if extraction.profile == Profile::Fallback {
        warn!(
            source = %inbound.source,
            fingerprint = %fingerprint,
            "payload matched no known shape, identity reduced to source"
        );
        state.metrics.record_fallback_profile();
    }
    debug!(
        fingerprint = %fingerprint,
        profile = extraction.profile.as_str(),
        fields = %fingerprint::canonical_text(&extraction.fields),
        "fingerprint computed"
    );

    let guard = if settings.serialize_per_fingerprint {
        Some(state.fingerprint_locks.acquire(&fingerprint).await)
    } else {
        None
    };

    let original = resolver::resolve_at(
        state.event_repo.as_ref(),
        &fingerprint,
        settings.window_hours,
        inbound.received_at,
    )
    .await;
    let decision = DuplicateDecision::from_lookup(original);

    let classification = match &decision {
        DuplicateDecision::DuplicateOf(original) => original
            .classification
            .clone()
            .unwrap_or_else(|| rule_classifier::classify(&inbound.payload, &inbound.source)),
        DuplicateDecision::Original => {
            classify_or_fallback(state, &inbound.payload, &inbound.source).await
        }
    };

    let event = NewAlertEvent::from_inbound(&inbound, fingerprint.clone(), classification.clone());
    let outcome = recorder::record(
        state.event_repo.as_ref(),
        state.fallback_store.as_ref(),
        event,
        &decision,
    )
    .await;
    drop(guard);

    if outcome.is_duplicate {
        state.metrics.record_duplicate();
    }
    if outcome.storage != StorageStatus::Stored {
        state.metrics.record_storage_fallback();
    }

    let gate = forwarding_gate::evaluate(
        &classification,
        outcome.is_duplicate,
        settings.forward_duplicates,
    );
    let forward_status = if gate.forward {
        deliver(state, &inbound, &classification).await
    } else {
        if let Some(reason) = gate.reason {
            info!(event_id = %outcome.event_id, "forward skipped: {}", reason);
        }
        ForwardStatus::Skipped
    };
    state.metrics.record_forward(forward_status);

    if let Some(id) = outcome.event_id.stored_id() {
        if let Err(err) = state
            .event_repo
            .update_forward_status(id, forward_status)
            .await
        {
            warn!(event_id = id, "failed to record forward status: {}", err);
        }
    }

    IngestResult {
        event_id: outcome.event_id,
        is_duplicate: outcome.is_duplicate,
        duplicate_of: outcome.original_id,
        forward_decision: gate.forward,
        forward_reason: gate.reason_code(),
        forward_status,
        storage: outcome.storage,
        fingerprint,
        profile: extraction.profile,
        classification,
    }
}

async fn deliver(
    state: &AppState,
    inbound: &InboundWebhook,
    classification: &Classification,
) -> ForwardStatus {
    let request = DeliveryRequest {
        source: inbound.source.clone(),
        received_at: inbound.received_at,
        client_ip: inbound.client_ip.clone(),
        payload: inbound.payload.clone(),
        classification: classification.clone(),
    };
    let report = state.notifier.deliver(&request, None).await;
    if report.status.is_failure() {
        warn!(
            source = %inbound.source,
            status = report.status.as_str(),
            "forward failed: {}",
            report.message.as_deref().unwrap_or("no detail")
        );
    }
    report.status
}
