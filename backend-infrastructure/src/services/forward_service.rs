use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use backend_domain::ports::NotificationSink;
use backend_domain::{DeliveryReport, DeliveryRequest, ForwardStatus, Importance, RuntimeConfig};

const PREVIEW_CHARS: usize = 500;

/// Posts classified events to a chat-bot card endpoint or a generic JSON
/// receiver, depending on the target URL.
pub struct HttpNotificationSink {
    client: Client,
    enabled: bool,
    forward_url: Option<String>,
}

impl HttpNotificationSink {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.forward_timeout_seconds.max(1)))
            .build()?;
        Ok(Self {
            client,
            enabled: config.enable_forward,
            forward_url: config.forward_url.clone(),
        })
    }

    fn resolve_target(&self, target: Option<&str>) -> Option<String> {
        match target {
            Some(url) => Some(url.to_string()),
            None if self.enabled => self.forward_url.clone(),
            None => None,
        }
    }
}

#[async_trait]
impl NotificationSink for HttpNotificationSink {
    async fn deliver(&self, request: &DeliveryRequest, target: Option<&str>) -> DeliveryReport {
        let Some(url) = self.resolve_target(target) else {
            return DeliveryReport::disabled();
        };

        let card = is_card_target(&url);
        let body = if card {
            build_card(request)
        } else {
            build_envelope(request)
        };
        let mut builder = self.client.post(&url).json(&body);
        if !card {
            builder = builder
                .header("X-Webhook-Source", format!("analyzed-{}", request.source))
                .header("X-Analysis-Importance", request.classification.importance.as_str());
        }

        let (status, status_code, message) = match builder.send().await {
            Ok(response) => {
                let code = response.status();
                if code.is_success() {
                    (ForwardStatus::Delivered, Some(code.as_u16()), None)
                } else {
                    let text = response.text().await.unwrap_or_default();
                    let text: String = text.chars().take(PREVIEW_CHARS).collect();
                    (ForwardStatus::Rejected, Some(code.as_u16()), Some(text))
                }
            }
            Err(err) => (classify_send_error(&err), None, Some(err.to_string())),
        };

        if status == ForwardStatus::Delivered {
            info!(url = %url, source = %request.source, "event forwarded");
        } else {
            warn!(
                url = %url,
                status = status.as_str(),
                "forward did not succeed: {}",
                message.as_deref().unwrap_or("")
            );
        }
        DeliveryReport {
            status,
            target: Some(url),
            status_code,
            message,
        }
    }

    async fn check_target(&self) -> Result<()> {
        let Some(url) = self.resolve_target(None) else {
            anyhow::bail!("forward url not configured");
        };
        let response = self.client.get(&url).send().await?;
        if response.status().is_server_error() {
            anyhow::bail!("forward target responded {}", response.status());
        }
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn classify_send_error(err: &reqwest::Error) -> ForwardStatus {
    if err.is_timeout() {
        ForwardStatus::TimedOut
    } else {
        ForwardStatus::Unreachable
    }
}

pub fn is_card_target(url: &str) -> bool {
    url.contains("feishu.cn") || url.contains("lark")
}

pub fn build_envelope(request: &DeliveryRequest) -> Value {
    json!({
        "original_data": request.payload,
        "original_source": request.source,
        "original_timestamp": request.received_at.to_rfc3339(),
        "classification": request.classification,
        "processed_by": "beacon",
        "client_ip": request.client_ip,
    })
}

fn importance_style(importance: Importance) -> (&'static str, &'static str) {
    match importance {
        Importance::High => ("red", "🔴 High"),
        Importance::Medium => ("orange", "🟠 Medium"),
        Importance::Low => ("green", "🟢 Low"),
    }
}

fn markdown_div(content: String) -> Value {
    json!({
        "tag": "div",
        "text": { "tag": "lark_md", "content": content }
    })
}

fn short_field(label: &str, value: &str) -> Value {
    json!({
        "is_short": true,
        "text": { "tag": "lark_md", "content": format!("**{}**\n{}", label, value) }
    })
}

/// Interactive card for Feishu/Lark bots.
pub fn build_card(request: &DeliveryRequest) -> Value {
    let verdict = &request.classification;
    let (color, importance_label) = importance_style(verdict.importance);
    let event_type = if verdict.event_type.is_empty() {
        "unknown"
    } else {
        verdict.event_type.as_str()
    };
    let summary = if verdict.summary.is_empty() {
        "no summary"
    } else {
        verdict.summary.as_str()
    };

    let mut elements = vec![
        json!({
            "tag": "div",
            "fields": [
                short_field("Source", &request.source),
                short_field("Importance", importance_label),
                short_field("Event type", event_type),
                short_field("Time", &request.received_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            ]
        }),
        markdown_div(format!("**📝 Summary**\n{}", summary)),
    ];

    if let Some(scope) = verdict.extra_str("impact_scope").filter(|scope| !scope.is_empty()) {
        elements.push(markdown_div(format!("**🎯 Impact scope**\n{}", scope)));
    }
    if !verdict.actions.is_empty() {
        let actions = verdict
            .actions
            .iter()
            .enumerate()
            .map(|(i, action)| format!("{}. {}", i + 1, action))
            .collect::<Vec<_>>()
            .join("\n");
        elements.push(markdown_div(format!("**✅ Suggested actions**\n{}", actions)));
    }
    if !verdict.risks.is_empty() {
        let risks = verdict
            .risks
            .iter()
            .map(|risk| format!("⚠️ {}", risk))
            .collect::<Vec<_>>()
            .join("\n");
        elements.push(markdown_div(format!("**⚠️ Risks**\n{}", risks)));
    }
    elements.push(json!({ "tag": "hr" }));

    let has_payload = match &request.payload {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    };
    if has_payload {
        let pretty = serde_json::to_string_pretty(&request.payload).unwrap_or_default();
        let preview: String = pretty.chars().take(PREVIEW_CHARS).collect();
        elements.push(markdown_div(format!(
            "**📦 Original payload**\n```json\n{}\n```",
            preview
        )));
    }

    json!({
        "msg_type": "interactive",
        "card": {
            "config": { "wide_screen_mode": true },
            "header": {
                "title": { "tag": "plain_text", "content": "📡 Webhook event" },
                "template": color
            },
            "elements": elements
        }
    })
}
