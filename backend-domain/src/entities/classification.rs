// Classification entity
// Importance verdict attached to an event, produced by the LLM or the rule fallback

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value_objects::Importance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Classification {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    /// Anything else the classifier returned (impact_scope, monitoring_suggestions, data_type, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Classification {
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}
