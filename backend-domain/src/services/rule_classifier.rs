// Rule-based classification, used whenever the LLM classifier is unavailable or fails

use serde_json::{Map, Value};

use crate::entities::Classification;
use crate::value_objects::Importance;

const SEVERE_KEYWORDS: &[&str] = &["error", "failure", "critical", "alert"];
const COMPLETED_KEYWORDS: &[&str] = &["success", "completed", "finished"];
const BUSINESS_KEYWORDS: &[&str] = &["user", "order", "payment"];

pub fn classify(payload: &Value, source: &str) -> Classification {
    let event = payload
        .get("event")
        .map(|value| match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let event_lower = event.to_lowercase();

    let mut verdict = Classification {
        source: source.to_string(),
        event_type: if event.is_empty() {
            "unknown".to_string()
        } else {
            event.clone()
        },
        importance: Importance::Medium,
        summary: String::new(),
        actions: Vec::new(),
        risks: Vec::new(),
        extra: Map::new(),
    };

    if contains_any(&event_lower, SEVERE_KEYWORDS) {
        verdict.importance = Importance::High;
        verdict.summary = format!("Severe event detected: {}", event_lower);
        verdict.actions.push("Inspect the detailed logs immediately".to_string());
        verdict.actions.push("Notify the owning team".to_string());
        verdict.risks.push("May affect service stability".to_string());
    } else if contains_any(&event_lower, COMPLETED_KEYWORDS) {
        verdict.importance = Importance::Low;
        verdict.summary = format!("Completed normally: {}", event_lower);
        verdict.actions.push("Record in the log".to_string());
    } else if contains_any(&event_lower, BUSINESS_KEYWORDS) {
        verdict.importance = Importance::High;
        verdict.summary = format!("Business-critical event: {}", event_lower);
        verdict.actions.push("Verify data integrity".to_string());
        verdict.actions.push("Update business state".to_string());
    } else if !event_lower.is_empty() {
        verdict.summary = format!("General event: {}", event_lower);
        verdict.actions.push("Routine handling".to_string());
    } else {
        verdict.actions.push("Routine handling".to_string());
    }

    if has_any_key(payload, &["user_id", "email"]) {
        verdict
            .extra
            .insert("data_type".to_string(), Value::String("user_related".to_string()));
    }
    if has_any_key(payload, &["amount", "price"]) {
        verdict
            .extra
            .insert("data_type".to_string(), Value::String("financial".to_string()));
        verdict
            .risks
            .push("Involves financial data, verify before acting".to_string());
    }

    if verdict.summary.is_empty() {
        verdict.summary = format!("Webhook event received from {}", source);
    }
    verdict
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn has_any_key(payload: &Value, keys: &[&str]) -> bool {
    payload
        .as_object()
        .map(|map| keys.iter().any(|key| map.contains_key(*key)))
        .unwrap_or(false)
}
