// Backend Application Layer

pub mod classify;
pub mod commands;
pub mod dedup;
pub mod error;
pub mod metrics;
pub mod queries;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::AppError;
pub use metrics::Metrics;
pub use state::AppState;
