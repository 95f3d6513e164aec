// Event entity
// One received webhook occurrence, as persisted

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::Classification;
use crate::value_objects::{EventId, Fingerprint, ForwardStatus};

/// A webhook as it arrived, before any dedup decision.
#[derive(Debug, Clone)]
pub struct InboundWebhook {
    pub source: String,
    pub client_ip: Option<String>,
    pub received_at: DateTime<Utc>,
    pub raw_payload: String,
    pub headers: Value,
    pub payload: Value,
}

/// Row to be written by the event recorder.
#[derive(Debug, Clone, Serialize)]
pub struct NewAlertEvent {
    pub source: String,
    pub client_ip: Option<String>,
    pub received_at: DateTime<Utc>,
    pub raw_payload: String,
    pub headers: Value,
    pub parsed_payload: Value,
    pub fingerprint: Fingerprint,
    pub classification: Classification,
    pub forward_status: ForwardStatus,
}

impl NewAlertEvent {
    pub fn from_inbound(
        inbound: &InboundWebhook,
        fingerprint: Fingerprint,
        classification: Classification,
    ) -> Self {
        Self {
            source: inbound.source.clone(),
            client_ip: inbound.client_ip.clone(),
            received_at: inbound.received_at,
            raw_payload: inbound.raw_payload.clone(),
            headers: inbound.headers.clone(),
            parsed_payload: inbound.payload.clone(),
            fingerprint,
            classification,
            forward_status: ForwardStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: EventId,
    pub source: String,
    pub client_ip: Option<String>,
    pub received_at: DateTime<Utc>,
    pub raw_payload: String,
    pub headers: Value,
    pub parsed_payload: Value,
    pub fingerprint: Fingerprint,
    pub classification: Option<Classification>,
    pub forward_status: ForwardStatus,
    pub is_duplicate: bool,
    pub duplicate_of: Option<EventId>,
    pub duplicate_count: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub data: Vec<Value>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub from_fallback: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EventPageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
