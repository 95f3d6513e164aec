use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::fs;
use tracing::{info, warn};

use backend_domain::ports::FallbackStore;
use backend_domain::NewAlertEvent;

/// One pretty-printed JSON document per event, named by source and arrival time.
pub struct FileFallbackStore {
    dir: PathBuf,
}

impl FileFallbackStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn file_name(event: &NewAlertEvent) -> String {
    let source: String = event
        .source
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let short: String = event.fingerprint.as_str().chars().take(8).collect();
    format!(
        "{}_{}_{}.json",
        source,
        event.received_at.format("%Y%m%d_%H%M%S_%6f"),
        short
    )
}

#[async_trait]
impl FallbackStore for FileFallbackStore {
    async fn store(&self, event: &NewAlertEvent) -> anyhow::Result<String> {
        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir).await?;
        }
        let name = file_name(event);
        let document = json!({
            "source": event.source,
            "timestamp": event.received_at.to_rfc3339(),
            "client_ip": event.client_ip,
            "headers": event.headers,
            "raw_payload": event.raw_payload,
            "parsed_data": event.parsed_payload,
            "fingerprint": event.fingerprint,
            "classification": event.classification,
            "forward_status": event.forward_status,
        });
        let content = serde_json::to_string_pretty(&document)?;
        fs::write(self.dir.join(&name), content).await?;
        info!(file = %name, "event written to fallback store");
        Ok(name)
    }

    async fn list_recent(&self, limit: usize) -> anyhow::Result<Vec<Value>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let modified = entry.metadata().await?.modified()?;
            files.push((modified, path));
        }
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        let mut documents = Vec::new();
        for (_, path) in files.into_iter().take(limit) {
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(err) => {
                    warn!("failed to read {}: {}", path.display(), err);
                    continue;
                }
            };
            match serde_json::from_str::<Value>(&content) {
                Ok(mut document) => {
                    if let (Some(map), Some(name)) = (
                        document.as_object_mut(),
                        path.file_name().and_then(|name| name.to_str()),
                    ) {
                        map.insert("file".to_string(), Value::String(name.to_string()));
                    }
                    documents.push(document);
                }
                Err(err) => warn!("skipping unreadable fallback file {}: {}", path.display(), err),
            }
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_domain::{Classification, Fingerprint, InboundWebhook};
    use chrono::{Duration, Utc};

    fn event(source: &str, offset_seconds: i64) -> NewAlertEvent {
        let payload = json!({"event": "queue.backlog"});
        let inbound = InboundWebhook {
            source: source.to_string(),
            client_ip: None,
            received_at: Utc::now() + Duration::seconds(offset_seconds),
            raw_payload: payload.to_string(),
            headers: json!({}),
            payload,
        };
        NewAlertEvent::from_inbound(
            &inbound,
            Fingerprint("0123456789abcdef".to_string()),
            Classification::default(),
        )
    }

    #[tokio::test]
    async fn stores_and_lists_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFallbackStore::new(dir.path().join("webhooks_data"));

        let name = store.store(&event("ci/build", 0)).await.unwrap();
        assert!(name.starts_with("ci_build_"));
        assert!(name.ends_with("_01234567.json"));
        store.store(&event("ops", 1)).await.unwrap();

        let listed = store.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|doc| doc["file"] == name.as_str()));
        assert_eq!(listed[0]["parsed_data"]["event"], "queue.backlog");
        assert_eq!(store.list_recent(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFallbackStore::new(dir.path().join("absent"));
        assert!(store.list_recent(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let store = FileFallbackStore::new(dir.path());
        store.store(&event("ops", 0)).await.unwrap();
        let listed = store.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["source"], "ops");
    }
}
