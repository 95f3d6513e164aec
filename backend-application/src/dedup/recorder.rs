use backend_domain::ports::{EventRepository, FallbackStore};
use backend_domain::{AlertEvent, EventRef, NewAlertEvent, RecordOutcome, StorageStatus};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum DuplicateDecision {
    Original,
    DuplicateOf(AlertEvent),
}

impl DuplicateDecision {
    pub fn from_lookup(original: Option<AlertEvent>) -> Self {
        match original {
            Some(original) => DuplicateDecision::DuplicateOf(original),
            None => DuplicateDecision::Original,
        }
    }
}

/// Persists one occurrence. Duplicates inherit the original's classification
/// and bump its counter. Whatever fails, the caller gets an id back.
pub async fn record(
    repo: &dyn EventRepository,
    fallback: &dyn FallbackStore,
    mut event: NewAlertEvent,
    decision: &DuplicateDecision,
) -> RecordOutcome {
    let primary = match decision {
        DuplicateDecision::Original => repo
            .insert_original(&event)
            .await
            .map(|id| (id, false, None)),
        DuplicateDecision::DuplicateOf(original) => {
            if let Some(classification) = &original.classification {
                event.classification = classification.clone();
            }
            repo.insert_duplicate(&event, original.id)
                .await
                .map(|id| (id, true, Some(original.id)))
        }
    };

    match primary {
        Ok((id, is_duplicate, original_id)) => {
            info!(
                event_id = id,
                fingerprint = %event.fingerprint,
                is_duplicate,
                "webhook event recorded"
            );
            RecordOutcome {
                event_id: EventRef::Stored(id),
                is_duplicate,
                original_id,
                storage: StorageStatus::Stored,
            }
        }
        Err(err) => {
            error!(
                fingerprint = %event.fingerprint,
                "primary store write failed, using fallback: {}",
                err
            );
            match fallback.store(&event).await {
                Ok(reference) => RecordOutcome {
                    event_id: EventRef::Fallback(reference),
                    is_duplicate: false,
                    original_id: None,
                    storage: StorageStatus::Fallback,
                },
                Err(err) => {
                    error!(
                        fingerprint = %event.fingerprint,
                        "fallback store write failed, event not persisted: {}",
                        err
                    );
                    RecordOutcome {
                        event_id: EventRef::Ephemeral(Uuid::new_v4()),
                        is_duplicate: false,
                        original_id: None,
                        storage: StorageStatus::Unpersisted,
                    }
                }
            }
        }
    }
}
