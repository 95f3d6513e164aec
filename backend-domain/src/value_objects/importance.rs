// Importance value object

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Importance::High)
    }
}

impl Default for Importance {
    fn default() -> Self {
        Importance::Medium
    }
}

impl From<&str> for Importance {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Importance::High,
            "low" => Importance::Low,
            _ => Importance::Medium,
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Classifiers answer with free text ("HIGH", "critical", ...); anything
// unrecognised lands on medium instead of failing the whole verdict.
impl<'de> Deserialize<'de> for Importance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Importance::from(raw.as_str()))
    }
}
