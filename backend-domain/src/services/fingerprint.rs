// Alert fingerprinting
//
// Reduces a heterogeneous alert payload to the fields that identify the
// underlying condition, then digests them into a stable token. Volatile
// fields (per-firing ids, current metric values, timestamps) never take part.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::value_objects::Fingerprint;

pub const SOURCE_KEY: &str = "source";

/// Canonical identity fields, key-sorted.
pub type KeyFields = BTreeMap<String, Value>;

// (label name in the alert instance, key in the identity mapping)
const STRUCTURED_LABELS: &[(&str, &str)] = &[
    ("alertname", "alertname"),
    ("internal_label_alert_level", "alert_level"),
    ("severity", "severity"),
    ("host", "host"),
    ("instance", "instance"),
    ("pod", "pod"),
    ("namespace", "namespace"),
    ("service", "service"),
    ("path", "path"),
    ("method", "method"),
];

const GENERIC_FIELDS: &[(&str, &str)] = &[
    ("Type", "type"),
    ("RuleName", "rule_name"),
    ("event", "event"),
    ("event_type", "event_type"),
    ("MetricName", "metric_name"),
    ("Level", "level"),
    ("alert_id", "alert_id"),
    ("alert_name", "alert_name"),
    ("service", "service"),
];

const RESOURCE_ID_KEY: &str = "resource_id";
const RESOURCES_KEY: &str = "Resources";

/// Extraction strategy, chosen by payload shape in fixed priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Alerting-rule format: `alerts[]` plus a rule name.
    Structured,
    /// Cloud-monitor / generic flat format.
    Generic,
    /// Nothing recognised; identity degenerates to the source label.
    Fallback,
}

impl Profile {
    pub fn detect(payload: &Value) -> Profile {
        if is_structured(payload) {
            Profile::Structured
        } else if is_generic(payload) {
            Profile::Generic
        } else {
            Profile::Fallback
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Structured => "structured",
            Profile::Generic => "generic",
            Profile::Fallback => "fallback",
        }
    }

    fn extract_into(&self, payload: &Value, fields: &mut KeyFields) {
        match self {
            Profile::Structured => extract_structured(payload, fields),
            Profile::Generic => extract_generic(payload, fields),
            Profile::Fallback => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub profile: Profile,
    pub fields: KeyFields,
}

/// Maps a payload and its source label to the identity fields.
pub fn extract(payload: &Value, source: &str) -> Extraction {
    let mut fields = KeyFields::new();
    fields.insert(SOURCE_KEY.to_string(), Value::String(source.to_string()));

    let mut profile = Profile::detect(payload);
    profile.extract_into(payload, &mut fields);
    // A generic-looking payload whose recognised keys were all null/empty
    // carries no more identity than the fallback does.
    if fields.len() == 1 {
        profile = Profile::Fallback;
    }
    Extraction { profile, fields }
}

/// Digests identity fields into a 64-char lowercase hex token.
pub fn hash(fields: &KeyFields) -> Fingerprint {
    let digest = Sha256::digest(canonical_text(fields).as_bytes());
    Fingerprint(hex::encode(digest))
}

pub fn fingerprint(payload: &Value, source: &str) -> (Fingerprint, Extraction) {
    let extraction = extract(payload, source);
    (hash(&extraction.fields), extraction)
}

/// Compact JSON object with keys in lexicographic order.
pub fn canonical_text(fields: &KeyFields) -> String {
    let mut out = String::from("{");
    for (idx, (key, value)) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        out.push_str(&canonical_json(value));
    }
    out.push('}');
    out
}

fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        Value::String(key.clone()),
                        canonical_json(&map[key.as_str()])
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        }
        Value::Array(items) => {
            let body = items.iter().map(canonical_json).collect::<Vec<_>>().join(",");
            format!("[{}]", body)
        }
        scalar => scalar.to_string(),
    }
}

fn is_structured(payload: &Value) -> bool {
    let Some(first) = first_alert(payload) else {
        return false;
    };
    payload.get("alertingRuleName").is_some()
        || first
            .get("labels")
            .and_then(|labels| labels.get("alertname"))
            .is_some()
}

fn is_generic(payload: &Value) -> bool {
    let Some(map) = payload.as_object() else {
        return false;
    };
    GENERIC_FIELDS.iter().any(|(name, _)| map.contains_key(*name))
        || map.contains_key(RESOURCE_ID_KEY)
        || map.contains_key(RESOURCES_KEY)
}

fn first_alert(payload: &Value) -> Option<&Value> {
    payload
        .get("alerts")
        .and_then(Value::as_array)
        .and_then(|alerts| alerts.first())
        .filter(|alert| alert.is_object())
}

fn extract_structured(payload: &Value, fields: &mut KeyFields) {
    insert_field(fields, "alerting_rule_name", payload.get("alertingRuleName"));

    let Some(alert) = first_alert(payload) else {
        return;
    };
    if let Some(labels) = alert.get("labels").and_then(Value::as_object) {
        for (label, key) in STRUCTURED_LABELS {
            insert_field(fields, key, labels.get(*label));
        }
    }
    // Upstream correlation token, stable across re-firings of one series.
    insert_field(fields, "fingerprint", alert.get("fingerprint"));
}

fn extract_generic(payload: &Value, fields: &mut KeyFields) {
    for (name, key) in GENERIC_FIELDS {
        insert_field(fields, key, payload.get(*name));
    }

    let first_resource = payload
        .get(RESOURCES_KEY)
        .and_then(Value::as_array)
        .and_then(|resources| resources.first())
        .filter(|resource| resource.is_object());
    if let Some(resource) = first_resource {
        let instance = resource
            .get("InstanceId")
            .filter(|value| !value.is_null())
            .or_else(|| resource.get("id"));
        insert_field(fields, RESOURCE_ID_KEY, instance);
    }
    // top-level resource_id wins over the resources array
    insert_field(fields, RESOURCE_ID_KEY, payload.get(RESOURCE_ID_KEY));
}

fn insert_field(fields: &mut KeyFields, key: &str, value: Option<&Value>) {
    let value = match value {
        None | Some(Value::Null) => return,
        Some(nested @ (Value::Array(_) | Value::Object(_))) => {
            Value::String(canonical_json(nested))
        }
        Some(scalar) => scalar.clone(),
    };
    fields.insert(key.to_string(), value);
}
