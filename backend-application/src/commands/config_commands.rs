use backend_domain::{
    DedupSettings, DedupSettingsUpdate, MAX_DUPLICATE_WINDOW_HOURS, MIN_DUPLICATE_WINDOW_HOURS,
};
use tracing::info;

use crate::{AppError, AppState};

/// Applies a partial update to the dedup knobs. Takes effect for the next
/// webhook; nothing already recorded is touched.
pub async fn update_dedup_settings(
    state: &AppState,
    update: DedupSettingsUpdate,
) -> Result<DedupSettings, AppError> {
    if let Some(hours) = update.duplicate_window_hours {
        if !DedupSettings::window_in_range(hours) {
            return Err(AppError::BadRequest(format!(
                "duplicate_window_hours must be between {} and {}",
                MIN_DUPLICATE_WINDOW_HOURS, MAX_DUPLICATE_WINDOW_HOURS
            )));
        }
    }

    let mut settings = state.dedup.write().await;
    if let Some(hours) = update.duplicate_window_hours {
        settings.window_hours = hours;
    }
    if let Some(forward) = update.forward_duplicate_alerts {
        settings.forward_duplicates = forward;
    }
    if let Some(serialize) = update.serialize_per_fingerprint {
        settings.serialize_per_fingerprint = serialize;
    }
    info!(
        window_hours = settings.window_hours,
        forward_duplicates = settings.forward_duplicates,
        serialize_per_fingerprint = settings.serialize_per_fingerprint,
        "dedup settings updated"
    );
    Ok(*settings)
}
