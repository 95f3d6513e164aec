// Use cases that change state
pub mod config_commands;
pub mod event_commands;
pub mod ingest_commands;
