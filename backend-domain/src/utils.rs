use chrono::{DateTime, Duration, Utc};

pub fn micros_to_utc(us: i64) -> DateTime<Utc> {
    let secs = us.div_euclid(1_000_000);
    let nanos = (us.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or_else(Utc::now)
}

/// Inclusive lower bound of a dedup window ending at `now`.
pub fn window_start(now: DateTime<Utc>, window_hours: u32) -> DateTime<Utc> {
    now - Duration::hours(i64::from(window_hours))
}

pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
