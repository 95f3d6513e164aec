use axum::routing::{get, post, put};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{event_handlers, ops_handlers, webhook_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handlers::receive_webhook))
        .route(
            "/webhook/:source",
            post(webhook_handlers::receive_webhook_with_source),
        )
        .route("/health", get(ops_handlers::health_live))
        .route("/health/ready", get(ops_handlers::health_ready))
        .route("/api/webhooks", get(event_handlers::list_webhooks))
        .route("/api/webhooks/:id", get(event_handlers::get_webhook))
        .route(
            "/api/webhooks/:id/reanalyze",
            post(event_handlers::reanalyze_webhook),
        )
        .route(
            "/api/webhooks/:id/forward",
            post(event_handlers::forward_webhook),
        )
        .route("/api/config", get(ops_handlers::get_config))
        .route("/api/config/dedup", put(ops_handlers::update_dedup_config))
        .route(
            "/api/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
