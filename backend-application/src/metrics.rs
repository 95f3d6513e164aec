use std::sync::atomic::{AtomicU64, Ordering};

use backend_domain::ForwardStatus;

#[derive(Debug, Default)]
pub struct Metrics {
    webhooks_received: AtomicU64,
    webhooks_malformed: AtomicU64,
    duplicates: AtomicU64,
    fallback_profile: AtomicU64,
    classifier_fallbacks: AtomicU64,
    forwards_delivered: AtomicU64,
    forwards_failed: AtomicU64,
    forwards_skipped: AtomicU64,
    storage_fallbacks: AtomicU64,
}

impl Metrics {
    pub fn record_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.webhooks_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_profile(&self) {
        self.fallback_profile.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classifier_fallback(&self) {
        self.classifier_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_fallback(&self) {
        self.storage_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forward(&self, status: ForwardStatus) {
        let counter = match status {
            ForwardStatus::Delivered => &self.forwards_delivered,
            ForwardStatus::Skipped | ForwardStatus::Disabled => &self.forwards_skipped,
            ForwardStatus::Rejected | ForwardStatus::Unreachable | ForwardStatus::TimedOut => {
                &self.forwards_failed
            }
            ForwardStatus::Pending => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("beacon_webhooks_received_total", &self.webhooks_received),
            ("beacon_webhooks_malformed_total", &self.webhooks_malformed),
            ("beacon_duplicates_total", &self.duplicates),
            ("beacon_fingerprint_fallback_profile_total", &self.fallback_profile),
            ("beacon_classifier_fallbacks_total", &self.classifier_fallbacks),
            ("beacon_forwards_delivered_total", &self.forwards_delivered),
            ("beacon_forwards_failed_total", &self.forwards_failed),
            ("beacon_forwards_skipped_total", &self.forwards_skipped),
            ("beacon_storage_fallbacks_total", &self.storage_fallbacks),
        ];

        let mut out = String::new();
        for (name, counter) in counters {
            out.push_str(&format!(
                "# TYPE {} counter\n{} {}\n",
                name,
                name,
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}
