//! Stable error codes surfaced at the request/response boundary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable error code
///
/// The string form is part of the public contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input
    ValidationError,
    /// Entity missing or outside the caller's organization
    NotFound,
    /// Operation not allowed in the current status
    InvalidStatus,
    /// Assessment no longer accepts responses
    AssessmentLocked,
    /// Task transition not in the transition table
    InvalidTransition,
    /// N/A answered on a mandatory control
    MandatoryControl,
    /// Notes required before review
    NotesRequired,
    /// Evidence required before closure
    EvidenceRequired,
    /// Justification required before deferral
    JustificationRequired,
    /// Rejection note required when sending a task back
    RejectionNoteRequired,
    /// Role lacks the capability
    Forbidden,
    /// Organization onboarding not complete
    OnboardingIncomplete,
    /// Referenced user is not a member of the organization
    InvalidUser,
    /// External dependency failed
    ServiceUnavailable,
    /// Unexpected storage or infrastructure failure
    InternalError,
}

impl ErrorCode {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::AssessmentLocked => "ASSESSMENT_LOCKED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::MandatoryControl => "MANDATORY_CONTROL",
            Self::NotesRequired => "NOTES_REQUIRED",
            Self::EvidenceRequired => "EVIDENCE_REQUIRED",
            Self::JustificationRequired => "JUSTIFICATION_REQUIRED",
            Self::RejectionNoteRequired => "REJECTION_NOTE_REQUIRED",
            Self::Forbidden => "FORBIDDEN",
            Self::OnboardingIncomplete => "ONBOARDING_INCOMPLETE",
            Self::InvalidUser => "INVALID_USER",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Conventional HTTP status for transports that need one
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError | Self::InvalidUser => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InvalidStatus | Self::AssessmentLocked | Self::OnboardingIncomplete => 409,
            Self::InvalidTransition
            | Self::MandatoryControl
            | Self::NotesRequired
            | Self::EvidenceRequired
            | Self::JustificationRequired
            | Self::RejectionNoteRequired => 422,
            Self::ServiceUnavailable => 503,
            Self::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        let json = serde_json::to_string(&ErrorCode::RejectionNoteRequired).unwrap();
        assert_eq!(json, "\"REJECTION_NOTE_REQUIRED\"");
        assert_eq!(ErrorCode::RejectionNoteRequired.as_str(), "REJECTION_NOTE_REQUIRED");
    }

    #[test]
    fn test_transition_errors_are_unprocessable() {
        assert_eq!(ErrorCode::InvalidTransition.http_status(), 422);
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::Forbidden.http_status(), 403);
    }
}
