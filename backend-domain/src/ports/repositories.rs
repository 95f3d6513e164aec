use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::entities::{AlertEvent, Classification, NewAlertEvent};
use crate::value_objects::{EventId, Fingerprint, ForwardStatus};

/// Primary event store.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;

    /// Most recent original (non-duplicate) event with this fingerprint
    /// received at or after `since`.
    async fn find_original_since(
        &self,
        fingerprint: &Fingerprint,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Option<AlertEvent>>;

    async fn insert_original(&self, event: &NewAlertEvent) -> anyhow::Result<EventId>;

    /// Increments the original's counter in place and inserts the duplicate
    /// row, both in one transaction.
    async fn insert_duplicate(
        &self,
        event: &NewAlertEvent,
        original_id: EventId,
    ) -> anyhow::Result<EventId>;

    async fn get_event(&self, id: EventId) -> anyhow::Result<Option<AlertEvent>>;
    async fn list_events(&self, offset: u64, limit: u32) -> anyhow::Result<Vec<AlertEvent>>;
    async fn count_events(&self) -> anyhow::Result<u64>;
    async fn update_forward_status(&self, id: EventId, status: ForwardStatus) -> anyhow::Result<()>;
    async fn update_classification(
        &self,
        id: EventId,
        classification: &Classification,
    ) -> anyhow::Result<()>;
    async fn ping(&self) -> anyhow::Result<()>;
}

/// Best-effort store used when the primary store rejects a write.
#[async_trait]
pub trait FallbackStore: Send + Sync {
    /// Returns a reference (e.g. file name) identifying the stored document.
    async fn store(&self, event: &NewAlertEvent) -> anyhow::Result<String>;
    async fn list_recent(&self, limit: usize) -> anyhow::Result<Vec<Value>>;
}
