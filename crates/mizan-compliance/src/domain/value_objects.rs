//! Value Objects
//!
//! Answers, gap classification, language tags and the deadline policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::catalog::RiskLevel;

/// Per-control answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Answer {
    Yes,
    Partial,
    No,
    Na,
}

impl Answer {
    /// Gap classification, `None` for passing and N/A answers
    pub fn gap_type(&self) -> Option<GapType> {
        match self {
            Self::No => Some(GapType::Gap),
            Self::Partial => Some(GapType::Partial),
            Self::Yes | Self::Na => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::Partial => "PARTIAL",
            Self::No => "NO",
            Self::Na => "NA",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("answer must be one of YES, PARTIAL, NO, NA (got {0:?})")]
pub struct InvalidAnswer(pub String);

impl FromStr for Answer {
    type Err = InvalidAnswer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "YES" => Ok(Self::Yes),
            "PARTIAL" => Ok(Self::Partial),
            "NO" => Ok(Self::No),
            "NA" => Ok(Self::Na),
            other => Err(InvalidAnswer(other.to_string())),
        }
    }
}

/// Kind of gap a remediation task closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapType {
    /// Answered NO
    Gap,
    /// Answered PARTIAL
    Partial,
}

/// Language tag carried through to generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    #[default]
    En,
}

/// Remediation deadline offsets per risk level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlinePolicy {
    pub critical_days: i64,
    pub high_days: i64,
    pub medium_days: i64,
    pub low_days: i64,
}

impl DeadlinePolicy {
    pub fn days_for(&self, risk: RiskLevel) -> i64 {
        match risk {
            RiskLevel::Critical => self.critical_days,
            RiskLevel::High => self.high_days,
            RiskLevel::Medium => self.medium_days,
            RiskLevel::Low => self.low_days,
        }
    }

    pub fn deadline_for(&self, risk: RiskLevel, from: DateTime<Utc>) -> DateTime<Utc> {
        from + Duration::days(self.days_for(risk))
    }
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            critical_days: 30,
            high_days: 60,
            medium_days: 90,
            low_days: 180,
        }
    }
}
