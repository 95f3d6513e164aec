use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use backend_domain::ports::Classifier;
use backend_domain::{Classification, RuntimeConfig};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an operations alert analyst. \
    Assess each webhook event and reply with a single JSON object only.";

/// Classifier backed by an OpenAI-compatible chat completions endpoint.
pub struct LlmClassifier {
    client: Client,
    enabled: bool,
    api_url: String,
    api_key: Option<String>,
    model: String,
    system_prompt: String,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl LlmClassifier {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_seconds.max(1)))
            .build()?;
        let system_prompt = if config.llm_system_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            config.llm_system_prompt.clone()
        };
        Ok(Self {
            client,
            enabled: config.enable_classification,
            api_url: config.llm_api_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
            system_prompt,
        })
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, payload: &Value, source: &str) -> Result<Classification> {
        if !self.enabled {
            return Err(anyhow!("classification disabled"));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("llm_api_key not configured"))?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": build_prompt(payload, source) },
            ],
            "temperature": 0.3,
            "max_tokens": 1000,
        });
        let completion: ChatCompletion = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("classifier returned an empty reply"))?;
        debug!(source, "classifier reply: {}", content);
        parse_verdict(&content, source)
    }
}

fn build_prompt(payload: &Value, source: &str) -> String {
    let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    format!(
        r#"Analyse the following webhook event.

Source: {source}
Payload:
```json
{pretty}
```

Reply in this JSON shape:

```json
{{
  "source": "originating system",
  "event_type": "event type",
  "importance": "high/medium/low",
  "summary": "one-sentence summary",
  "actions": ["suggested action"],
  "risks": ["potential risk"],
  "impact_scope": "affected scope",
  "monitoring_suggestions": ["monitoring suggestion"]
}}
```

Importance guide:
- high: alert level critical/error/P0; 4xx/5xx QPS far above threshold (over 4x); service outage or errors; security incidents; payment anomalies; database failures; CPU, memory or disk usage above 90%.
- medium: alert level warning; 4xx/5xx QPS moderately above threshold (2x to 4x); performance problems or slow queries; ordinary business warnings.
- low: alert level info; successful or routine operations; plain notifications.

For cloud monitoring alerts (fields such as Type, RuleName, Level) weigh the Level field, status-code QPS metrics, CurrentValue against Threshold, and the affected Resources.

Return the JSON object only."#
    )
}

/// Body of the first fenced block (```json preferred), or the whole reply.
pub fn extract_json_block(reply: &str) -> &str {
    for fence in ["```json", "```"] {
        if let Some(start) = reply.find(fence) {
            let body = &reply[start + fence.len()..];
            let end = body.find("```").unwrap_or(body.len());
            return body[..end].trim();
        }
    }
    reply.trim()
}

pub fn parse_verdict(reply: &str, source: &str) -> Result<Classification> {
    let mut value: Value = serde_json::from_str(extract_json_block(reply))?;
    let map = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("classifier reply is not a JSON object"))?;
    let has_source = map
        .get("source")
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    if !has_source {
        map.insert("source".to_string(), Value::String(source.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}
