use anyhow::{anyhow, Result};

use backend_domain::{DedupSettings, MAX_DUPLICATE_WINDOW_HOURS, MIN_DUPLICATE_WINDOW_HOURS};

pub fn validate_window_hours(hours: u32) -> Result<()> {
    if !DedupSettings::window_in_range(hours) {
        return Err(anyhow!(
            "duplicate_window_hours must be between {} and {}, got {}",
            MIN_DUPLICATE_WINDOW_HOURS,
            MAX_DUPLICATE_WINDOW_HOURS,
            hours
        ));
    }
    Ok(())
}

pub fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let value = value.trim();
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(anyhow!("{} must start with http:// or https://", field));
    }
    Ok(())
}
