use std::sync::Arc;

use backend_domain::ports::{
    Classifier, EventRepository, FallbackStore, HealthCheckService, NotificationSink,
};
use backend_domain::{DedupSettings, RuntimeConfig};
use tokio::sync::RwLock;

use crate::dedup::FingerprintLocks;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub dedup: Arc<RwLock<DedupSettings>>,
    pub event_repo: Arc<dyn EventRepository>,
    pub fallback_store: Arc<dyn FallbackStore>,
    pub classifier: Arc<dyn Classifier>,
    pub notifier: Arc<dyn NotificationSink>,
    pub health: Arc<dyn HealthCheckService>,
    pub fingerprint_locks: Arc<FingerprintLocks>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub async fn dedup_settings(&self) -> DedupSettings {
        *self.dedup.read().await
    }
}
