//! Inbound ports (Use case traits)
//!
//! Every operation takes the acting principal; tenant scoping is enforced
//! behind these traits, so an entity from another organization is simply
//! not found.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mizan_common::{Actor, AssessmentId, ErrorBody, ErrorCode, OrgId, TaskId};

use super::outbound::RepositoryError;
use crate::application::dto::*;
use crate::domain::aggregates::{AssessmentError, TaskError};
use crate::domain::value_objects::Language;

/// Assessment lifecycle use cases
#[async_trait]
pub trait AssessmentUseCases: Send + Sync {
    /// Create a DRAFT assessment, archiving the previous one
    async fn create_assessment(&self, actor: &Actor) -> Result<AssessmentView, UseCaseError>;

    /// Assessments of the actor's organization, newest version first
    async fn list_assessments(&self, actor: &Actor) -> Result<Vec<AssessmentSummary>, UseCaseError>;

    /// Assessment with responses and progress
    async fn get_assessment(&self, actor: &Actor, id: &AssessmentId) -> Result<AssessmentView, UseCaseError>;

    /// Upsert one response, raising a remediation task when it is a gap
    async fn submit_response(
        &self,
        actor: &Actor,
        command: SubmitResponseCommand,
    ) -> Result<ResponseOutcome, UseCaseError>;

    /// Score and lock the assessment
    async fn finalize_assessment(&self, actor: &Actor, id: &AssessmentId) -> Result<AssessmentView, UseCaseError>;

    /// DRAFT -> IN_REVIEW
    async fn submit_for_review(&self, actor: &Actor, id: &AssessmentId) -> Result<AssessmentView, UseCaseError>;

    /// Controls applying to the actor's organization, grouped by domain
    async fn list_applicable_controls(&self, actor: &Actor) -> Result<Vec<DomainControls>, UseCaseError>;
}

/// Remediation workflow use cases
#[async_trait]
pub trait RemediationUseCases: Send + Sync {
    /// Filtered tasks, most urgent risk first, then earliest deadline
    async fn list_tasks(&self, actor: &Actor, filter: TaskFilter) -> Result<Vec<TaskView>, UseCaseError>;

    async fn get_task(&self, actor: &Actor, id: &TaskId) -> Result<TaskView, UseCaseError>;

    async fn change_task_status(
        &self,
        actor: &Actor,
        command: ChangeTaskStatusCommand,
    ) -> Result<TaskView, UseCaseError>;

    async fn assign_task(&self, actor: &Actor, command: AssignTaskCommand) -> Result<TaskView, UseCaseError>;

    /// Non-closed tasks past their deadline at `now`
    async fn overdue_tasks(&self, actor: &Actor, now: DateTime<Utc>) -> Result<Vec<TaskView>, UseCaseError>;
}

/// Remediation guidance use cases
#[async_trait]
pub trait GuidanceUseCases: Send + Sync {
    /// Cached or freshly generated guidance; degrades to a fallback text
    async fn guidance_for_task(
        &self,
        actor: &Actor,
        task_id: &TaskId,
        language: Language,
    ) -> Result<GuidanceText, UseCaseError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UseCaseError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    InvalidStatus(String),
    #[error("{0}")]
    AssessmentLocked(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("{0}")]
    MandatoryControl(String),
    #[error("{0}")]
    NotesRequired(String),
    #[error("{0}")]
    EvidenceRequired(String),
    #[error("{0}")]
    JustificationRequired(String),
    #[error("{0}")]
    RejectionNoteRequired(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("onboarding is not complete for organization {0}")]
    OnboardingIncomplete(OrgId),
    #[error("invalid user: {0}")]
    InvalidUser(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl UseCaseError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidStatus(_) => ErrorCode::InvalidStatus,
            Self::AssessmentLocked(_) => ErrorCode::AssessmentLocked,
            Self::InvalidTransition(_) => ErrorCode::InvalidTransition,
            Self::MandatoryControl(_) => ErrorCode::MandatoryControl,
            Self::NotesRequired(_) => ErrorCode::NotesRequired,
            Self::EvidenceRequired(_) => ErrorCode::EvidenceRequired,
            Self::JustificationRequired(_) => ErrorCode::JustificationRequired,
            Self::RejectionNoteRequired(_) => ErrorCode::RejectionNoteRequired,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::OnboardingIncomplete(_) => ErrorCode::OnboardingIncomplete,
            Self::InvalidUser(_) => ErrorCode::InvalidUser,
            Self::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            Self::Repository(_) => ErrorCode::InternalError,
        }
    }

    /// Code plus message, ready for any transport
    pub fn body(&self) -> ErrorBody {
        let message = match self {
            // Storage details stay in the logs.
            Self::Repository(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        ErrorBody { code: self.code(), message }
    }
}

impl From<AssessmentError> for UseCaseError {
    fn from(err: AssessmentError) -> Self {
        let message = err.to_string();
        match err {
            AssessmentError::Locked { .. } => Self::AssessmentLocked(message),
            AssessmentError::InvalidStatus { .. } => Self::InvalidStatus(message),
            AssessmentError::MandatoryControl(_) => Self::MandatoryControl(message),
            AssessmentError::JustificationTooShort { .. } => Self::Validation(message),
        }
    }
}

impl From<TaskError> for UseCaseError {
    fn from(err: TaskError) -> Self {
        let message = err.to_string();
        match err {
            TaskError::InvalidTransition { .. } => Self::InvalidTransition(message),
            TaskError::NotesRequired => Self::NotesRequired(message),
            TaskError::Forbidden { .. } => Self::Forbidden(message),
            TaskError::EvidenceRequired => Self::EvidenceRequired(message),
            TaskError::JustificationRequired => Self::JustificationRequired(message),
            TaskError::RejectionNoteRequired => Self::RejectionNoteRequired(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{AssessmentStatus, TaskStatus};

    #[test]
    fn test_domain_errors_map_to_codes() {
        let locked: UseCaseError = AssessmentError::Locked { status: AssessmentStatus::Finalized }.into();
        assert_eq!(locked.code(), ErrorCode::AssessmentLocked);

        let short: UseCaseError = AssessmentError::JustificationTooShort { min: 20 }.into();
        assert_eq!(short.code(), ErrorCode::ValidationError);

        let invalid: UseCaseError = TaskError::InvalidTransition {
            from: TaskStatus::Closed,
            to: TaskStatus::Open,
        }
        .into();
        assert_eq!(invalid.code(), ErrorCode::InvalidTransition);
        assert_eq!(invalid.code().http_status(), 422);
    }

    #[test]
    fn test_repository_errors_are_opaque() {
        let err = UseCaseError::from(RepositoryError::Connection("db:5432 refused".into()));
        let body = err.body();
        assert_eq!(body.code, ErrorCode::InternalError);
        assert!(!body.message.contains("5432"));
    }
}
