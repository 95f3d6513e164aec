use backend_domain::ports::EventRepository;
use backend_domain::utils::window_start;
use backend_domain::{AlertEvent, Fingerprint};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Finds the original an incoming alert duplicates, if any. A lookup failure
/// is reported and treated as "no original" so ingestion never stalls on it.
pub async fn resolve(
    repo: &dyn EventRepository,
    fingerprint: &Fingerprint,
    window_hours: u32,
) -> Option<AlertEvent> {
    resolve_at(repo, fingerprint, window_hours, Utc::now()).await
}

pub async fn resolve_at(
    repo: &dyn EventRepository,
    fingerprint: &Fingerprint,
    window_hours: u32,
    now: DateTime<Utc>,
) -> Option<AlertEvent> {
    let since = window_start(now, window_hours);
    match repo.find_original_since(fingerprint, since).await {
        Ok(Some(original)) => {
            debug!(
                fingerprint = %fingerprint,
                original_id = original.id,
                window_hours,
                "duplicate of earlier alert"
            );
            Some(original)
        }
        Ok(None) => None,
        Err(err) => {
            warn!(
                fingerprint = %fingerprint,
                "duplicate lookup failed, treating alert as new: {}",
                err
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inbound, structured_alert, MemoryRepo};
    use backend_domain::{Classification, NewAlertEvent};
    use chrono::Duration;
    use std::sync::atomic::Ordering;

    fn recorded(received_at: DateTime<Utc>) -> NewAlertEvent {
        let mut arrival = inbound("prom", structured_alert("h1"));
        arrival.received_at = received_at;
        NewAlertEvent::from_inbound(&arrival, Fingerprint("fp-1".to_string()), Classification::default())
    }

    #[tokio::test]
    async fn finds_original_inside_window() {
        let repo = MemoryRepo::default();
        assert!(resolve(&repo, &Fingerprint("fp-1".to_string()), 24).await.is_none());

        let id = repo.insert_original(&recorded(Utc::now())).await.unwrap();
        let found = resolve(&repo, &Fingerprint("fp-1".to_string()), 24).await;
        assert_eq!(found.map(|event| event.id), Some(id));
        assert!(resolve(&repo, &Fingerprint("fp-2".to_string()), 24).await.is_none());
    }

    #[tokio::test]
    async fn ignores_originals_older_than_window() {
        let repo = MemoryRepo::default();
        repo.insert_original(&recorded(Utc::now() - Duration::hours(3)))
            .await
            .unwrap();
        assert!(resolve(&repo, &Fingerprint("fp-1".to_string()), 2).await.is_none());
        assert!(resolve(&repo, &Fingerprint("fp-1".to_string()), 4).await.is_some());
    }

    #[tokio::test]
    async fn lookup_error_reads_as_no_original() {
        let repo = MemoryRepo::default();
        repo.insert_original(&recorded(Utc::now())).await.unwrap();
        repo.fail_lookup.store(true, Ordering::SeqCst);
        assert!(resolve(&repo, &Fingerprint("fp-1".to_string()), 24).await.is_none());
    }
}
