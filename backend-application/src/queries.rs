// Read-only use cases
pub mod config_queries;
pub mod event_queries;
