//! Compliance Configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::value_objects::DeadlinePolicy;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Remediation deadline offsets
    pub deadlines: DeadlinePolicy,
    /// Minimum characters of an N/A justification
    pub na_justification_min_chars: usize,
    /// Remediation guidance generation
    pub guidance: GuidanceConfig,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            deadlines: DeadlinePolicy::default(),
            na_justification_min_chars: 20,
            guidance: GuidanceConfig::default(),
        }
    }
}

impl ComplianceConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, or fall back to defaults with a warning
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config not usable, using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.deadlines;
        for (name, days) in [
            ("critical_days", d.critical_days),
            ("high_days", d.high_days),
            ("medium_days", d.medium_days),
            ("low_days", d.low_days),
        ] {
            if days <= 0 {
                return Err(ConfigError::Invalid(format!("deadlines.{name} must be positive")));
            }
        }
        if self.na_justification_min_chars == 0 {
            return Err(ConfigError::Invalid("na_justification_min_chars must be positive".into()));
        }
        if self.guidance.ttl_hours == 0 || self.guidance.timeout_secs == 0 {
            return Err(ConfigError::Invalid("guidance ttl and timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Guidance cache and timeout settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    pub ttl_hours: u32,
    pub timeout_secs: u64,
}

impl GuidanceConfig {
    pub fn ttl(&self) -> Duration {
        Duration::hours(i64::from(self.ttl_hours))
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
