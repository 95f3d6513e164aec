use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::ports::{EventRepository, HealthCheckService, NotificationSink};

pub struct DefaultHealthService {
    event_repo: Arc<dyn EventRepository>,
    notifier: Arc<dyn NotificationSink>,
}

impl DefaultHealthService {
    pub fn new(event_repo: Arc<dyn EventRepository>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            event_repo,
            notifier,
        }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_database(&self) -> anyhow::Result<bool> {
        self.event_repo.ping().await.map(|_| true)
    }

    /// A disabled forwarder has nothing to reach and counts as ready.
    async fn check_forward_target(&self) -> anyhow::Result<bool> {
        if !self.notifier.is_enabled() {
            return Ok(true);
        }
        self.notifier.check_target().await.map(|_| true)
    }
}
