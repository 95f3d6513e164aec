use backend_domain::ConfigView;

use crate::AppState;

/// Effective configuration with secrets reduced to "is set" flags.
pub async fn get_config_view(state: &AppState) -> ConfigView {
    let settings = state.dedup_settings().await;
    ConfigView {
        runtime: state.config.clone(),
        api_token_set: state.config.api_token.is_some(),
        webhook_secret_set: state.config.webhook_secret.is_some(),
        llm_api_key_set: state.config.llm_api_key.is_some(),
        duplicate_window_hours: settings.window_hours,
        forward_duplicate_alerts: settings.forward_duplicates,
        serialize_per_fingerprint: settings.serialize_per_fingerprint,
    }
}
