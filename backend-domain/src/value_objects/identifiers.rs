// Identifier value objects

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary-store row id of a recorded event.
pub type EventId = i64;

/// Hex SHA-256 identity token of an alert condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Id handed back to the caller for an accepted webhook. Always present,
/// whichever store (if any) took the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventRef {
    Stored(EventId),
    Fallback(String),
    Ephemeral(Uuid),
}

impl EventRef {
    pub fn stored_id(&self) -> Option<EventId> {
        match self {
            EventRef::Stored(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventRef::Stored(id) => write!(f, "{}", id),
            EventRef::Fallback(reference) => write!(f, "fallback:{}", reference),
            EventRef::Ephemeral(id) => write!(f, "ephemeral:{}", id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageStatus {
    Stored,
    Fallback,
    Unpersisted,
}
