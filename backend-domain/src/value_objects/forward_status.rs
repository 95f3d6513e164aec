// Forward status value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardStatus {
    Pending,
    Skipped,
    Delivered,
    Rejected,
    Unreachable,
    TimedOut,
    Disabled,
}

impl ForwardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardStatus::Pending => "pending",
            ForwardStatus::Skipped => "skipped",
            ForwardStatus::Delivered => "delivered",
            ForwardStatus::Rejected => "rejected",
            ForwardStatus::Unreachable => "unreachable",
            ForwardStatus::TimedOut => "timed_out",
            ForwardStatus::Disabled => "disabled",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ForwardStatus::Rejected | ForwardStatus::Unreachable | ForwardStatus::TimedOut
        )
    }
}

impl From<&str> for ForwardStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "skipped" => ForwardStatus::Skipped,
            "delivered" => ForwardStatus::Delivered,
            "rejected" => ForwardStatus::Rejected,
            "unreachable" => ForwardStatus::Unreachable,
            "timed_out" => ForwardStatus::TimedOut,
            "disabled" => ForwardStatus::Disabled,
            _ => ForwardStatus::Pending,
        }
    }
}
