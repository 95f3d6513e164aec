use backend_domain::{AlertEvent, EventId, EventPage, EventPageQuery};
use tracing::{error, warn};

use crate::{AppError, AppState};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Newest-first page of recorded events. When the primary store cannot be
/// read, the most recent fallback documents are listed instead.
pub async fn list_events(state: &AppState, query: EventPageQuery) -> Result<EventPage, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    match load_page(state, page, page_size).await {
        Ok(page) => Ok(page),
        Err(err) => {
            warn!("primary store unavailable, listing fallback records: {}", err);
            let data = state
                .fallback_store
                .list_recent(page_size as usize)
                .await
                .map_err(|err| {
                    error!("failed to list fallback records: {}", err);
                    AppError::Internal(err)
                })?;
            let total = data.len() as u64;
            Ok(EventPage {
                data,
                page: 1,
                page_size,
                total,
                total_pages: u64::from(total > 0),
                from_fallback: true,
            })
        }
    }
}

async fn load_page(state: &AppState, page: u32, page_size: u32) -> anyhow::Result<EventPage> {
    let total = state.event_repo.count_events().await?;
    let offset = u64::from(page - 1) * u64::from(page_size);
    let rows = state.event_repo.list_events(offset, page_size).await?;
    let data = rows
        .into_iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EventPage {
        data,
        page,
        page_size,
        total,
        total_pages: total.div_ceil(u64::from(page_size)),
        from_fallback: false,
    })
}

pub async fn get_event(state: &AppState, id: EventId) -> Result<AlertEvent, AppError> {
    state
        .event_repo
        .get_event(id)
        .await
        .map_err(|err| {
            error!(event_id = id, "failed to fetch event: {}", err);
            AppError::Internal(err)
        })?
        .ok_or(AppError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ingest_commands::process_webhook;
    use crate::testing::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn pages_are_newest_first_and_clamped() {
        let harness = Harness::high();
        for host in ["a", "b", "c"] {
            process_webhook(&harness.state, inbound("prom", structured_alert(host))).await;
        }
        let page = list_events(
            &harness.state,
            EventPageQuery {
                page: Some(2),
                page_size: Some(2),
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0]["id"], 1);
        assert!(!page.from_fallback);

        let clamped = list_events(
            &harness.state,
            EventPageQuery {
                page: Some(0),
                page_size: Some(1000),
            },
        )
        .await
        .unwrap();
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.page_size, MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn unavailable_store_lists_fallback_documents() {
        let harness = Harness::high();
        harness.repo.fail_writes.store(true, Ordering::SeqCst);
        process_webhook(&harness.state, inbound("prom", structured_alert("a"))).await;
        harness.repo.fail_lookup.store(true, Ordering::SeqCst);

        let page = list_events(&harness.state, EventPageQuery::default()).await.unwrap();
        assert!(page.from_fallback);
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0]["source"], "prom");
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let harness = Harness::high();
        assert!(matches!(get_event(&harness.state, 9).await, Err(AppError::NotFound)));
    }
}
