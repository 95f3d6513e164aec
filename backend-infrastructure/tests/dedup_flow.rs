use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::RwLock;

use backend_application::commands::ingest_commands::process_webhook;
use backend_application::dedup::{resolver, FingerprintLocks};
use backend_application::{AppState, Metrics};
use backend_domain::ports::{Classifier, EventRepository, HealthCheckService, NotificationSink};
use backend_domain::{
    AlertEvent, Classification, DedupSettings, DeliveryReport, DeliveryRequest, EventRef,
    ForwardStatus, Importance, InboundWebhook, Profile, RuntimeConfig,
};
use backend_infrastructure::{FileFallbackStore, SqliteEventRepository};

struct HighClassifier;

#[async_trait]
impl Classifier for HighClassifier {
    async fn classify(&self, _payload: &Value, source: &str) -> Result<Classification> {
        Ok(Classification {
            source: source.to_string(),
            importance: Importance::High,
            summary: "critical alert".to_string(),
            ..Classification::default()
        })
    }
}

struct AcceptingSink;

#[async_trait]
impl NotificationSink for AcceptingSink {
    async fn deliver(&self, _request: &DeliveryRequest, target: Option<&str>) -> DeliveryReport {
        DeliveryReport {
            status: ForwardStatus::Delivered,
            target: target.map(str::to_string),
            status_code: Some(200),
            message: None,
        }
    }

    async fn check_target(&self) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

struct NoHealth;

#[async_trait]
impl HealthCheckService for NoHealth {
    async fn check_database(&self) -> Result<bool> {
        Err(anyhow!("not used"))
    }

    async fn check_forward_target(&self) -> Result<bool> {
        Err(anyhow!("not used"))
    }
}

struct Fixture {
    state: AppState,
    repo: Arc<SqliteEventRepository>,
    _dir: tempfile::TempDir,
}

async fn fixture() -> Fixture {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let repo = Arc::new(SqliteEventRepository::new(pool));
    repo.ensure_schema().await.unwrap();
    let dir = tempfile::tempdir().unwrap();

    let config = RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        webhook_secret: None,
        fallback_dir: dir.path().to_string_lossy().to_string(),
        enable_classification: true,
        llm_api_key: None,
        llm_api_url: "https://llm.invalid/v1".to_string(),
        llm_model: "test".to_string(),
        llm_system_prompt: String::new(),
        llm_timeout_seconds: 1,
        enable_forward: true,
        forward_url: Some("https://hooks.invalid".to_string()),
        forward_timeout_seconds: 1,
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 5,
    };
    let state = AppState {
        config,
        dedup: Arc::new(RwLock::new(DedupSettings::default())),
        event_repo: repo.clone(),
        fallback_store: Arc::new(FileFallbackStore::new(dir.path())),
        classifier: Arc::new(HighClassifier),
        notifier: Arc::new(AcceptingSink),
        health: Arc::new(NoHealth),
        fingerprint_locks: Arc::new(FingerprintLocks::default()),
        metrics: Arc::new(Metrics::default()),
    };
    Fixture {
        state,
        repo,
        _dir: dir,
    }
}

fn inbound(source: &str, payload: Value, received_at: DateTime<Utc>) -> InboundWebhook {
    InboundWebhook {
        source: source.to_string(),
        client_ip: Some("192.0.2.10".to_string()),
        received_at,
        raw_payload: payload.to_string(),
        headers: json!({}),
        payload,
    }
}

fn rule_alert(host: &str, alert_id: &str, current_value: f64) -> Value {
    named_rule_alert("X", host, alert_id, current_value)
}

fn named_rule_alert(rule: &str, host: &str, alert_id: &str, current_value: f64) -> Value {
    json!({
        "alertingRuleName": rule,
        "alerts": [{
            "labels": {
                "alertname": "R1",
                "host": host,
                "internal_label_alert_id": alert_id,
                "severity": "critical"
            },
            "annotations": { "current_value": current_value },
            "startsAt": Utc::now().to_rfc3339()
        }]
    })
}

fn cloud_alarm() -> Value {
    json!({
        "Type": "AlarmNotification",
        "RuleName": "CPU",
        "Level": "critical",
        "Resources": [{ "InstanceId": "i-1" }]
    })
}

async fn stored(repo: &SqliteEventRepository, event_id: &EventRef) -> AlertEvent {
    let id = event_id.stored_id().expect("event should be in the primary store");
    repo.get_event(id).await.unwrap().unwrap()
}

#[tokio::test]
async fn repeated_rule_alert_counts_occurrences_on_original() {
    let fx = fixture().await;
    let now = Utc::now();

    let first = process_webhook(
        &fx.state,
        inbound("prom", rule_alert("h1", "a-1", 97.5), now - Duration::minutes(1)),
    )
    .await;
    let second =
        process_webhook(&fx.state, inbound("prom", rule_alert("h1", "a-2", 99.1), now)).await;

    assert!(!first.is_duplicate);
    assert!(second.is_duplicate);
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(second.duplicate_of, first.event_id.stored_id());

    let original = stored(&fx.repo, &first.event_id).await;
    assert_eq!(original.duplicate_count, 2);
    assert_eq!(original.forward_status, ForwardStatus::Delivered);

    let duplicate = stored(&fx.repo, &second.event_id).await;
    assert_eq!(duplicate.duplicate_of, Some(original.id));
    assert_eq!(duplicate.classification, original.classification);
    assert_eq!(duplicate.forward_status, ForwardStatus::Skipped);

    let other_rule = process_webhook(
        &fx.state,
        inbound("prom", named_rule_alert("Y", "h1", "a-3", 97.5), now),
    )
    .await;
    assert_eq!(first.profile, Profile::Structured);
    assert_ne!(other_rule.fingerprint, first.fingerprint);
    assert!(!other_rule.is_duplicate);
}

#[tokio::test]
async fn other_host_is_a_separate_original() {
    let fx = fixture().await;
    let first = process_webhook(&fx.state, inbound("prom", rule_alert("h1", "a-1", 90.0), Utc::now())).await;
    let second = process_webhook(&fx.state, inbound("prom", rule_alert("h2", "a-2", 90.0), Utc::now())).await;

    assert_ne!(first.fingerprint, second.fingerprint);
    assert!(!first.is_duplicate);
    assert!(!second.is_duplicate);
    assert_eq!(stored(&fx.repo, &first.event_id).await.duplicate_count, 1);
    assert_eq!(stored(&fx.repo, &second.event_id).await.duplicate_count, 1);
}

#[tokio::test]
async fn identical_cloud_alarm_three_times_yields_one_original() {
    let fx = fixture().await;
    let mut results = Vec::new();
    for _ in 0..3 {
        results.push(process_webhook(&fx.state, inbound("cloud", cloud_alarm(), Utc::now())).await);
    }

    let originals: Vec<_> = results.iter().filter(|r| !r.is_duplicate).collect();
    assert_eq!(originals.len(), 1);
    let original_id = originals[0].event_id.stored_id();
    assert!(results
        .iter()
        .filter(|r| r.is_duplicate)
        .all(|r| r.duplicate_of == original_id));

    let original = stored(&fx.repo, &originals[0].event_id).await;
    assert_eq!(original.duplicate_count, 3);
    assert_eq!(fx.repo.count_events().await.unwrap(), 3);
}

#[tokio::test]
async fn alarm_after_window_expiry_is_a_new_original() {
    let fx = fixture().await;
    let now = Utc::now();
    let early = process_webhook(&fx.state, inbound("cloud", cloud_alarm(), now - Duration::hours(25))).await;
    let late = process_webhook(&fx.state, inbound("cloud", cloud_alarm(), now)).await;

    assert_eq!(early.fingerprint, late.fingerprint);
    assert!(!early.is_duplicate);
    assert!(!late.is_duplicate);
    assert_eq!(stored(&fx.repo, &early.event_id).await.duplicate_count, 1);
}

#[tokio::test]
async fn window_lower_bound_is_inclusive_to_the_microsecond() {
    let fx = fixture().await;
    let t0 = Utc::now();
    let first = process_webhook(&fx.state, inbound("cloud", cloud_alarm(), t0)).await;
    let window = fx.state.dedup_settings().await.window_hours;

    let at_edge = t0 + Duration::hours(i64::from(window));
    let found = resolver::resolve_at(fx.repo.as_ref(), &first.fingerprint, window, at_edge).await;
    assert_eq!(found.map(|e| e.id), first.event_id.stored_id());

    let past_edge = at_edge + Duration::microseconds(1);
    let missed = resolver::resolve_at(fx.repo.as_ref(), &first.fingerprint, window, past_edge).await;
    assert!(missed.is_none());
}

#[tokio::test]
async fn shorter_window_set_at_runtime_applies_to_next_alert() {
    let fx = fixture().await;
    let now = Utc::now();
    process_webhook(&fx.state, inbound("cloud", cloud_alarm(), now - Duration::hours(2))).await;
    fx.state.dedup.write().await.window_hours = 1;
    let next = process_webhook(&fx.state, inbound("cloud", cloud_alarm(), now)).await;
    assert!(!next.is_duplicate);
}

#[tokio::test]
async fn concurrent_duplicates_do_not_lose_increments() {
    let fx = fixture().await;
    let state = Arc::new(fx.state.clone());
    let mut tasks = Vec::new();
    for _ in 0..6 {
        let state = state.clone();
        tasks.push(tokio::spawn(async move {
            process_webhook(&state, inbound("cloud", cloud_alarm(), Utc::now())).await
        }));
    }
    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }
    let original = results.iter().find(|r| !r.is_duplicate).unwrap();
    assert_eq!(results.iter().filter(|r| !r.is_duplicate).count(), 1);
    assert_eq!(stored(&fx.repo, &original.event_id).await.duplicate_count, 6);
}
