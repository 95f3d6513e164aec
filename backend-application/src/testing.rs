// In-memory port implementations for use-case tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use backend_domain::ports::{
    Classifier, EventRepository, FallbackStore, HealthCheckService, NotificationSink,
};
use backend_domain::{
    AlertEvent, Classification, DedupSettings, DeliveryReport, DeliveryRequest, EventId,
    Fingerprint, ForwardStatus, Importance, InboundWebhook, NewAlertEvent, RuntimeConfig,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::dedup::FingerprintLocks;
use crate::{AppState, Metrics};

#[derive(Default)]
pub struct MemoryRepo {
    pub events: Mutex<Vec<AlertEvent>>,
    pub fail_lookup: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryRepo {
    pub fn snapshot(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: &NewAlertEvent, duplicate_of: Option<EventId>) -> EventId {
        let mut events = self.events.lock().unwrap();
        let id = events.len() as EventId + 1;
        events.push(AlertEvent {
            id,
            source: event.source.clone(),
            client_ip: event.client_ip.clone(),
            received_at: event.received_at,
            raw_payload: event.raw_payload.clone(),
            headers: event.headers.clone(),
            parsed_payload: event.parsed_payload.clone(),
            fingerprint: event.fingerprint.clone(),
            classification: Some(event.classification.clone()),
            forward_status: event.forward_status,
            is_duplicate: duplicate_of.is_some(),
            duplicate_of,
            duplicate_count: 1,
            updated_at: event.received_at,
        });
        id
    }
}

#[async_trait]
impl EventRepository for MemoryRepo {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn find_original_since(
        &self,
        fingerprint: &Fingerprint,
        since: DateTime<Utc>,
    ) -> Result<Option<AlertEvent>> {
        // Gives concurrent callers a chance to interleave between lookup and insert.
        tokio::task::yield_now().await;
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(anyhow!("lookup unavailable"));
        }
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|e| &e.fingerprint == fingerprint && !e.is_duplicate && e.received_at >= since)
            .max_by_key(|e| (e.received_at, e.id))
            .cloned())
    }

    async fn insert_original(&self, event: &NewAlertEvent) -> Result<EventId> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        Ok(self.push(event, None))
    }

    async fn insert_duplicate(&self, event: &NewAlertEvent, original_id: EventId) -> Result<EventId> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        {
            let mut events = self.events.lock().unwrap();
            let original = events
                .iter_mut()
                .find(|e| e.id == original_id)
                .ok_or_else(|| anyhow!("original {} missing", original_id))?;
            original.duplicate_count += 1;
        }
        Ok(self.push(event, Some(original_id)))
    }

    async fn get_event(&self, id: EventId) -> Result<Option<AlertEvent>> {
        Ok(self.events.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn list_events(&self, offset: u64, limit: u32) -> Result<Vec<AlertEvent>> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(anyhow!("lookup unavailable"));
        }
        let mut events = self.snapshot();
        events.reverse();
        Ok(events
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_events(&self) -> Result<u64> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(anyhow!("lookup unavailable"));
        }
        Ok(self.events.lock().unwrap().len() as u64)
    }

    async fn update_forward_status(&self, id: EventId, status: ForwardStatus) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        if let Some(event) = events.iter_mut().find(|e| e.id == id) {
            event.forward_status = status;
        }
        Ok(())
    }

    async fn update_classification(&self, id: EventId, classification: &Classification) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        if let Some(event) = events.iter_mut().find(|e| e.id == id) {
            event.classification = Some(classification.clone());
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFallback {
    pub documents: Mutex<Vec<Value>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl FallbackStore for MemoryFallback {
    async fn store(&self, event: &NewAlertEvent) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("disk full"));
        }
        let mut documents = self.documents.lock().unwrap();
        documents.push(serde_json::to_value(event)?);
        Ok(format!("webhook_{}.json", documents.len()))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Value>> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

pub struct StaticClassifier {
    pub verdict: Option<Classification>,
    pub calls: AtomicUsize,
}

impl StaticClassifier {
    pub fn returning(importance: Importance) -> Self {
        Self {
            verdict: Some(Classification {
                source: "llm".to_string(),
                event_type: "alert".to_string(),
                importance,
                summary: "classified".to_string(),
                ..Classification::default()
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            verdict: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, _payload: &Value, _source: &str) -> Result<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
            .clone()
            .ok_or_else(|| anyhow!("classifier returned no JSON object"))
    }
}

pub struct RecordingSink {
    pub status: ForwardStatus,
    pub enabled: bool,
    pub delivered: Mutex<Vec<(DeliveryRequest, Option<String>)>>,
}

impl RecordingSink {
    pub fn with_status(status: ForwardStatus) -> Self {
        Self {
            status,
            enabled: true,
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn deliveries(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, request: &DeliveryRequest, target: Option<&str>) -> DeliveryReport {
        self.delivered
            .lock()
            .unwrap()
            .push((request.clone(), target.map(str::to_string)));
        DeliveryReport {
            status: self.status,
            target: target.map(str::to_string).or_else(|| Some("https://hooks.test/bot".to_string())),
            status_code: Some(200),
            message: None,
        }
    }

    async fn check_target(&self) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub struct HealthyChecks;

#[async_trait]
impl HealthCheckService for HealthyChecks {
    async fn check_database(&self) -> Result<bool> {
        Ok(true)
    }

    async fn check_forward_target(&self) -> Result<bool> {
        Ok(true)
    }
}

pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        webhook_secret: None,
        fallback_dir: "webhooks_data".to_string(),
        enable_classification: true,
        llm_api_key: Some("sk-test".to_string()),
        llm_api_url: "https://llm.test/v1".to_string(),
        llm_model: "test-model".to_string(),
        llm_system_prompt: String::new(),
        llm_timeout_seconds: 5,
        enable_forward: true,
        forward_url: Some("https://hooks.test/bot".to_string()),
        forward_timeout_seconds: 5,
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 10,
    }
}

pub struct Harness {
    pub state: AppState,
    pub repo: Arc<MemoryRepo>,
    pub fallback: Arc<MemoryFallback>,
    pub classifier: Arc<StaticClassifier>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(classifier: StaticClassifier, sink: RecordingSink) -> Self {
        let repo = Arc::new(MemoryRepo::default());
        let fallback = Arc::new(MemoryFallback::default());
        let classifier = Arc::new(classifier);
        let sink = Arc::new(sink);
        let state = AppState {
            config: test_config(),
            dedup: Arc::new(RwLock::new(DedupSettings::default())),
            event_repo: repo.clone(),
            fallback_store: fallback.clone(),
            classifier: classifier.clone(),
            notifier: sink.clone(),
            health: Arc::new(HealthyChecks),
            fingerprint_locks: Arc::new(FingerprintLocks::default()),
            metrics: Arc::new(Metrics::default()),
        };
        Self {
            state,
            repo,
            fallback,
            classifier,
            sink,
        }
    }

    pub fn high() -> Self {
        Self::new(
            StaticClassifier::returning(Importance::High),
            RecordingSink::with_status(ForwardStatus::Delivered),
        )
    }
}

pub fn structured_alert(host: &str) -> Value {
    json!({
        "alertingRuleName": "HighCPU",
        "alerts": [{
            "labels": {
                "alertname": "HighCPU",
                "internal_label_alert_level": "P1",
                "severity": "critical",
                "host": host
            },
            "startsAt": Utc::now().to_rfc3339()
        }]
    })
}

pub fn inbound(source: &str, payload: Value) -> InboundWebhook {
    InboundWebhook {
        source: source.to_string(),
        client_ip: Some("10.0.0.1".to_string()),
        received_at: Utc::now(),
        raw_payload: payload.to_string(),
        headers: json!({"content-type": "application/json"}),
        payload,
    }
}
