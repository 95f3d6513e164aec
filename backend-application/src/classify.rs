use backend_domain::services::rule_classifier;
use backend_domain::Classification;
use serde_json::Value;
use tracing::warn;

use crate::AppState;

/// Classifier verdict, or the rule-based verdict when the classifier is
/// disabled, unreachable or returns something unusable.
pub async fn classify_or_fallback(state: &AppState, payload: &Value, source: &str) -> Classification {
    if !state.config.enable_classification {
        return rule_classifier::classify(payload, source);
    }
    match state.classifier.classify(payload, source).await {
        Ok(classification) => classification,
        Err(err) => {
            warn!(source, "classifier failed, using rule-based verdict: {}", err);
            state.metrics.record_classifier_fallback();
            rule_classifier::classify(payload, source)
        }
    }
}
