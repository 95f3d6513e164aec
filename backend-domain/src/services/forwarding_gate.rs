// Forwarding gate
// Pure decision: only high-importance events go downstream, duplicates only when allowed.

use std::fmt;

use serde::Serialize;

use crate::entities::Classification;
use crate::value_objects::Importance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NonHighImportance(Importance),
    DuplicateSuppressed,
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::NonHighImportance(_) => "non-high importance",
            SkipReason::DuplicateSuppressed => "duplicate suppressed by configuration",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NonHighImportance(importance) => write!(
                f,
                "importance is {}, only high importance events are forwarded",
                importance
            ),
            SkipReason::DuplicateSuppressed => {
                f.write_str("duplicate alert, forwarding of duplicates is disabled")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForwardDecision {
    pub forward: bool,
    pub reason: Option<SkipReason>,
}

impl ForwardDecision {
    pub fn reason_code(&self) -> Option<String> {
        self.reason.map(|reason| reason.code().to_string())
    }
}

pub fn evaluate(
    classification: &Classification,
    is_duplicate: bool,
    forward_duplicates: bool,
) -> ForwardDecision {
    if !classification.importance.is_high() {
        return ForwardDecision {
            forward: false,
            reason: Some(SkipReason::NonHighImportance(classification.importance)),
        };
    }
    if is_duplicate && !forward_duplicates {
        return ForwardDecision {
            forward: false,
            reason: Some(SkipReason::DuplicateSuppressed),
        };
    }
    ForwardDecision {
        forward: true,
        reason: None,
    }
}

pub fn should_forward(
    classification: &Classification,
    is_duplicate: bool,
    forward_duplicates: bool,
) -> bool {
    evaluate(classification, is_duplicate, forward_duplicates).forward
}
