use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::utils::normalize_optional_text;
use backend_domain::{DbConfig, DedupSettings, RuntimeConfig, DEFAULT_DUPLICATE_WINDOW_HOURS};

use crate::config::validation::{validate_http_url, validate_window_hours};
use crate::services::DEFAULT_SYSTEM_PROMPT;

pub const CONFIG_ENV: &str = "BEACON_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub webhook_secret: Option<String>,
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_timeout_seconds: u64,
    pub fallback_dir: String,
    pub log_dir: String,
    pub enable_classification: bool,
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_system_prompt: String,
    pub llm_timeout_seconds: u64,
    pub enable_forward: bool,
    pub forward_url: Option<String>,
    pub forward_timeout_seconds: u64,
    pub duplicate_window_hours: u32,
    pub forward_duplicate_alerts: bool,
    pub serialize_per_fingerprint: bool,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            api_token: None,
            webhook_secret: None,
            database_url: "sqlite://beacon.db".to_string(),
            database_max_connections: 5,
            database_timeout_seconds: 5,
            fallback_dir: "./webhooks_data".to_string(),
            log_dir: "./logs".to_string(),
            enable_classification: true,
            llm_api_key: None,
            llm_api_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            llm_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            llm_timeout_seconds: 30,
            enable_forward: false,
            forward_url: None,
            forward_timeout_seconds: 10,
            duplicate_window_hours: DEFAULT_DUPLICATE_WINDOW_HOURS,
            forward_duplicate_alerts: false,
            serialize_per_fingerprint: true,
            max_body_bytes: 2 * 1024 * 1024,
            request_timeout_seconds: 60,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(file_path.parent());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn normalize(&mut self) {
        self.api_token = normalize_optional_text(self.api_token.take());
        self.webhook_secret = normalize_optional_text(self.webhook_secret.take());
        self.llm_api_key = normalize_optional_text(self.llm_api_key.take());
        self.forward_url = normalize_optional_text(self.forward_url.take());
        self.database_url = self.database_url.trim().to_string();
        self.llm_api_url = self.llm_api_url.trim().trim_end_matches('/').to_string();
        if self.llm_system_prompt.trim().is_empty() {
            self.llm_system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.fallback_dir = resolve_path(base, &self.fallback_dir);
        self.log_dir = resolve_path(base, &self.log_dir);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.database_url.is_empty() {
            return Err(anyhow!("database_url must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        validate_window_hours(self.duplicate_window_hours)?;
        if self.enable_forward {
            let url = self
                .forward_url
                .as_deref()
                .ok_or_else(|| anyhow!("forward_url is required when enable_forward is set"))?;
            validate_http_url("forward_url", url)?;
        }
        if self.enable_classification {
            validate_http_url("llm_api_url", &self.llm_api_url)?;
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            webhook_secret: self.webhook_secret.clone(),
            fallback_dir: self.fallback_dir.clone(),
            enable_classification: self.enable_classification,
            llm_api_key: self.llm_api_key.clone(),
            llm_api_url: self.llm_api_url.clone(),
            llm_model: self.llm_model.clone(),
            llm_system_prompt: self.llm_system_prompt.clone(),
            llm_timeout_seconds: self.llm_timeout_seconds,
            enable_forward: self.enable_forward,
            forward_url: self.forward_url.clone(),
            forward_timeout_seconds: self.forward_timeout_seconds,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            timeout_seconds: self.database_timeout_seconds,
        }
    }

    pub fn to_dedup_settings(&self) -> DedupSettings {
        DedupSettings {
            window_hours: self.duplicate_window_hours,
            forward_duplicates: self.forward_duplicate_alerts,
            serialize_per_fingerprint: self.serialize_per_fingerprint,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("BEACON_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("BEACON_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("BEACON_WEBHOOK_SECRET") {
            self.webhook_secret = Some(value);
        }
        if let Ok(value) = env::var("BEACON_DATABASE_URL") {
            self.database_url = value;
        }
        if let Ok(value) = env::var("BEACON_DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections = value.parse().unwrap_or(self.database_max_connections);
        }
        if let Ok(value) = env::var("BEACON_DATABASE_TIMEOUT_SECONDS") {
            self.database_timeout_seconds = value.parse().unwrap_or(self.database_timeout_seconds);
        }
        if let Ok(value) = env::var("BEACON_FALLBACK_DIR") {
            self.fallback_dir = value;
        }
        if let Ok(value) = env::var("BEACON_LOG_DIR") {
            self.log_dir = value;
        }
        if let Ok(value) = env::var("BEACON_ENABLE_CLASSIFICATION") {
            self.enable_classification = value.parse().unwrap_or(self.enable_classification);
        }
        if let Ok(value) = env::var("BEACON_LLM_API_KEY") {
            self.llm_api_key = Some(value);
        }
        if let Ok(value) = env::var("BEACON_LLM_API_URL") {
            self.llm_api_url = value;
        }
        if let Ok(value) = env::var("BEACON_LLM_MODEL") {
            self.llm_model = value;
        }
        if let Ok(value) = env::var("BEACON_LLM_SYSTEM_PROMPT") {
            self.llm_system_prompt = value;
        }
        if let Ok(value) = env::var("BEACON_LLM_TIMEOUT_SECONDS") {
            self.llm_timeout_seconds = value.parse().unwrap_or(self.llm_timeout_seconds);
        }
        if let Ok(value) = env::var("BEACON_ENABLE_FORWARD") {
            self.enable_forward = value.parse().unwrap_or(self.enable_forward);
        }
        if let Ok(value) = env::var("BEACON_FORWARD_URL") {
            self.forward_url = Some(value);
        }
        if let Ok(value) = env::var("BEACON_FORWARD_TIMEOUT_SECONDS") {
            self.forward_timeout_seconds = value.parse().unwrap_or(self.forward_timeout_seconds);
        }
        if let Ok(value) = env::var("BEACON_DUPLICATE_WINDOW_HOURS") {
            self.duplicate_window_hours = value.parse().unwrap_or(self.duplicate_window_hours);
        }
        if let Ok(value) = env::var("BEACON_FORWARD_DUPLICATE_ALERTS") {
            self.forward_duplicate_alerts = value.parse().unwrap_or(self.forward_duplicate_alerts);
        }
        if let Ok(value) = env::var("BEACON_SERIALIZE_PER_FINGERPRINT") {
            self.serialize_per_fingerprint =
                value.parse().unwrap_or(self.serialize_per_fingerprint);
        }
        if let Ok(value) = env::var("BEACON_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("BEACON_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
