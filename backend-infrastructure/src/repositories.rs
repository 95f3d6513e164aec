pub mod fallback_files;
pub mod sqlite_events;

pub use fallback_files::*;
pub use sqlite_events::*;
