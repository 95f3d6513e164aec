use async_trait::async_trait;
use serde_json::Value;

use crate::entities::{Classification, DeliveryReport, DeliveryRequest};

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Importance verdict for a payload. Errors mean "use the rule fallback".
    async fn classify(&self, payload: &Value, source: &str) -> anyhow::Result<Classification>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers to `target`, or to the configured forward URL when `None`.
    async fn deliver(&self, request: &DeliveryRequest, target: Option<&str>) -> DeliveryReport;
    async fn check_target(&self) -> anyhow::Result<()>;
    fn is_enabled(&self) -> bool;
}

#[async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn check_database(&self) -> anyhow::Result<bool>;
    async fn check_forward_target(&self) -> anyhow::Result<bool>;
}
