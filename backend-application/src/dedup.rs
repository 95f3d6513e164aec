// Duplicate detection: window lookup, per-fingerprint serialisation and recording

pub mod locks;
pub mod recorder;
pub mod resolver;

pub use locks::{FingerprintGuard, FingerprintLocks};
pub use recorder::DuplicateDecision;
