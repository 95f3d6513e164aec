// Delivery entities
// Input and outcome of one notification-sink call

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::entities::Classification;
use crate::value_objects::ForwardStatus;

#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub source: String,
    pub received_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub payload: Value,
    pub classification: Classification,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub status: ForwardStatus,
    pub target: Option<String>,
    pub status_code: Option<u16>,
    pub message: Option<String>,
}

impl DeliveryReport {
    pub fn disabled() -> Self {
        Self {
            status: ForwardStatus::Disabled,
            target: None,
            status_code: None,
            message: Some("forwarding disabled".to_string()),
        }
    }
}
