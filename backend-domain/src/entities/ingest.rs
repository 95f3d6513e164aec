// Ingest outcome entities
// What the recorder and the ingest use case hand back to their callers

use serde::Serialize;

use crate::entities::Classification;
use crate::services::fingerprint::Profile;
use crate::value_objects::{EventId, EventRef, Fingerprint, ForwardStatus, StorageStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub event_id: EventRef,
    pub is_duplicate: bool,
    pub original_id: Option<EventId>,
    pub storage: StorageStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub event_id: EventRef,
    pub is_duplicate: bool,
    pub duplicate_of: Option<EventId>,
    pub forward_decision: bool,
    pub forward_reason: Option<String>,
    pub forward_status: ForwardStatus,
    pub storage: StorageStatus,
    pub fingerprint: Fingerprint,
    pub profile: Profile,
    pub classification: Classification,
}
