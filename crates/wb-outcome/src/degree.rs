//! The four-tier degree of success produced by a skill check.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Outcome tier of a skill check. Supplied by the host; the engine never rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeOfSuccess {
    /// Missed the DC by 10 or more, or a natural 1 turned a failure.
    CriticalFailure = 0,
    /// Below the DC.
    Failure = 1,
    /// Met the DC.
    Success = 2,
    /// Beat the DC by 10 or more, or a natural 20 turned a success.
    CriticalSuccess = 3,
}

impl DegreeOfSuccess {
    /// All degrees, worst first.
    pub const ALL: [Self; 4] = [
        Self::CriticalFailure,
        Self::Failure,
        Self::Success,
        Self::CriticalSuccess,
    ];

    /// Build a degree from its numeric index (0..=3).
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Returns true for Success and CriticalSuccess.
    pub fn is_success(self) -> bool {
        self >= Self::Success
    }

    /// Returns true for CriticalFailure and CriticalSuccess.
    pub fn is_critical(self) -> bool {
        matches!(self, Self::CriticalFailure | Self::CriticalSuccess)
    }
}

impl fmt::Display for DegreeOfSuccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CriticalFailure => write!(f, "Critical Failure"),
            Self::Failure => write!(f, "Failure"),
            Self::Success => write!(f, "Success"),
            Self::CriticalSuccess => write!(f, "Critical Success"),
        }
    }
}

impl FromStr for DegreeOfSuccess {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "crit-fail" | "critical-failure" | "0" => Ok(Self::CriticalFailure),
            "fail" | "failure" | "1" => Ok(Self::Failure),
            "success" | "2" => Ok(Self::Success),
            "crit-success" | "critical-success" | "3" => Ok(Self::CriticalSuccess),
            other => Err(EngineError::InvalidInput(format!(
                "unknown degree of success: {other}"
            ))),
        }
    }
}
