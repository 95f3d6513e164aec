// Pure domain services
pub mod fingerprint;
pub mod forwarding_gate;
pub mod rule_classifier;

pub use fingerprint::{Extraction, KeyFields, Profile};
pub use forwarding_gate::{ForwardDecision, SkipReason};
