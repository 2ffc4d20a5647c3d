//! Value Objects - Immutable identifiers with validation
//!
//! Value Objects are:
//! - Immutable
//! - Comparable by value (not identity)
//! - Self-validating

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised when constructing an identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Identifier was empty or whitespace
    #[error("{kind} cannot be empty")]
    Empty {
        /// Identifier kind
        kind: &'static str,
    },
    /// Identifier exceeded the maximum length
    #[error("{kind} exceeds {max} characters")]
    TooLong {
        /// Identifier kind
        kind: &'static str,
        /// Maximum length
        max: usize,
    },
    /// Identifier contained a forbidden character
    #[error("{kind} contains invalid character {ch:?}")]
    InvalidChar {
        /// Identifier kind
        kind: &'static str,
        /// Offending character
        ch: char,
    },
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Wrap an externally issued identifier
            pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(IdError::Empty { kind: $kind });
                }
                if id.len() > 128 {
                    return Err(IdError::TooLong { kind: $kind, max: 128 });
                }
                Ok(Self(id))
            }

            /// Get inner value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Organization (tenant) identifier
    OrgId,
    "organization id"
);
entity_id!(
    /// User identifier
    UserId,
    "user id"
);
entity_id!(
    /// Assessment identifier
    AssessmentId,
    "assessment id"
);
entity_id!(
    /// Remediation task identifier
    TaskId,
    "task id"
);
entity_id!(
    /// Evidence file identifier
    EvidenceId,
    "evidence id"
);

/// Control identifier (Value Object)
///
/// Stable catalog key such as `PDPL-G.1` or `NCA-ECC-2.3.1`.
///
/// # Invariants
/// - Must be non-empty
/// - Max 64 characters
/// - ASCII alphanumerics plus `-`, `.` and `_`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControlId(String);

impl ControlId {
    /// Create a control ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdError::Empty { kind: "control id" });
        }
        if id.len() > 64 {
            return Err(IdError::TooLong { kind: "control id", max: 64 });
        }
        if let Some(ch) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')))
        {
            return Err(IdError::InvalidChar { kind: "control id", ch });
        }
        Ok(Self(id))
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the ID belongs to the family starting with `prefix`
    pub fn in_family(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl TryFrom<String> for ControlId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ControlId> for String {
    fn from(id: ControlId) -> Self {
        id.0
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_id_validation() {
        assert!(ControlId::new("PDPL-G.1").is_ok());
        assert!(ControlId::new("NCA-ECC-2.3.1").is_ok());
        assert_eq!(
            ControlId::new(""),
            Err(IdError::Empty { kind: "control id" })
        );
        assert!(matches!(
            ControlId::new("PDPL G.1"),
            Err(IdError::InvalidChar { ch: ' ', .. })
        ));
    }

    #[test]
    fn test_control_id_family() {
        let id = ControlId::new("PDPL-TS.1").unwrap();
        assert!(id.in_family("PDPL-TS."));
        assert!(!id.in_family("PDPL-T."));
    }

    #[test]
    fn test_control_id_rejects_invalid_json() {
        let parsed: Result<ControlId, _> = serde_json::from_str("\"bad id\"");
        assert!(parsed.is_err());
        let parsed: ControlId = serde_json::from_str("\"MOH-G.1\"").unwrap();
        assert_eq!(parsed.as_str(), "MOH-G.1");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(TaskId::generate(), TaskId::generate());
        assert!(OrgId::new("   ").is_err());
    }
}
