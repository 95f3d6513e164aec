use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::info;

use backend_application::dedup::FingerprintLocks;
use backend_application::{AppState, Metrics};
use backend_domain::ports::{EventRepository, NotificationSink};
use backend_infrastructure::{
    AppConfig, DefaultHealthService, FileFallbackStore, HttpNotificationSink, LlmClassifier,
    SqliteEventRepository,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();
        let dedup = config.to_dedup_settings();

        let repo = Arc::new(SqliteEventRepository::connect(&db_config).await?);
        repo.ensure_schema().await?;
        let event_repo: Arc<dyn EventRepository> = repo;

        let notifier: Arc<dyn NotificationSink> =
            Arc::new(HttpNotificationSink::new(&runtime_config)?);
        let classifier = Arc::new(LlmClassifier::new(&runtime_config)?);
        let health = Arc::new(DefaultHealthService::new(
            event_repo.clone(),
            notifier.clone(),
        ));

        info!(
            database = %db_config.database_url,
            fallback_dir = %runtime_config.fallback_dir,
            window_hours = dedup.window_hours,
            classification = runtime_config.enable_classification,
            forward = runtime_config.enable_forward,
            "context initialised"
        );

        let state = AppState {
            fallback_store: Arc::new(FileFallbackStore::new(&runtime_config.fallback_dir)),
            config: runtime_config,
            dedup: Arc::new(RwLock::new(dedup)),
            event_repo,
            classifier,
            notifier,
            health,
            fingerprint_locks: Arc::new(FingerprintLocks::default()),
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
