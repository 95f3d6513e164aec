// Domain entities
pub mod classification;
pub mod config;
pub mod delivery;
pub mod event;
pub mod ingest;

pub use classification::*;
pub use config::*;
pub use delivery::*;
pub use event::*;
pub use ingest::*;
