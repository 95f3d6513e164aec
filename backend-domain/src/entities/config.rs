// Runtime configuration handed from infrastructure to the inner layers

use serde::{Deserialize, Serialize};

pub const DEFAULT_DUPLICATE_WINDOW_HOURS: u32 = 24;
pub const MIN_DUPLICATE_WINDOW_HOURS: u32 = 1;
pub const MAX_DUPLICATE_WINDOW_HOURS: u32 = 168;

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    pub fallback_dir: String,
    pub enable_classification: bool,
    #[serde(skip_serializing)]
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_system_prompt: String,
    pub llm_timeout_seconds: u64,
    pub enable_forward: bool,
    pub forward_url: Option<String>,
    pub forward_timeout_seconds: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

/// Knobs read by the duplicate resolver and the forwarding gate on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupSettings {
    pub window_hours: u32,
    pub forward_duplicates: bool,
    pub serialize_per_fingerprint: bool,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_DUPLICATE_WINDOW_HOURS,
            forward_duplicates: false,
            serialize_per_fingerprint: true,
        }
    }
}

impl DedupSettings {
    pub fn window_in_range(hours: u32) -> bool {
        (MIN_DUPLICATE_WINDOW_HOURS..=MAX_DUPLICATE_WINDOW_HOURS).contains(&hours)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DedupSettingsUpdate {
    pub duplicate_window_hours: Option<u32>,
    pub forward_duplicate_alerts: Option<bool>,
    pub serialize_per_fingerprint: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    #[serde(flatten)]
    pub runtime: RuntimeConfig,
    pub api_token_set: bool,
    pub webhook_secret_set: bool,
    pub llm_api_key_set: bool,
    pub duplicate_window_hours: u32,
    pub forward_duplicate_alerts: bool,
    pub serialize_per_fingerprint: bool,
}
