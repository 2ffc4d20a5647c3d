//! Domain Events
//!
//! Raised by the aggregates on every state change and turned into audit
//! entries by the application layer.

use chrono::{DateTime, Utc};
use mizan_common::{AssessmentId, ControlId, OrgId, TaskId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::aggregates::{AssessmentStatus, TaskStatus};
use super::catalog::RiskLevel;
use super::scoring::GapCounts;
use super::value_objects::{Answer, GapType};

/// All domain events in the compliance bounded context
#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Assessment(AssessmentEvent),
    Task(TaskEvent),
}

/// Assessment lifecycle events
#[derive(Clone, Debug, PartialEq)]
pub enum AssessmentEvent {
    Created {
        assessment_id: AssessmentId,
        org_id: OrgId,
        version: u32,
        created_at: DateTime<Utc>,
    },

    Archived {
        assessment_id: AssessmentId,
        org_id: OrgId,
        previous_status: AssessmentStatus,
    },

    SubmittedForReview {
        assessment_id: AssessmentId,
        org_id: OrgId,
    },

    ResponseSubmitted {
        assessment_id: AssessmentId,
        org_id: OrgId,
        control_id: ControlId,
        old_answer: Option<Answer>,
        new_answer: Answer,
    },

    Finalized {
        assessment_id: AssessmentId,
        org_id: OrgId,
        overall_score: Decimal,
        gaps: GapCounts,
        finalized_at: DateTime<Utc>,
    },
}

/// Remediation task events
#[derive(Clone, Debug, PartialEq)]
pub enum TaskEvent {
    Created {
        task_id: TaskId,
        org_id: OrgId,
        assessment_id: AssessmentId,
        control_id: ControlId,
        gap_type: GapType,
        risk_level: RiskLevel,
        deadline: DateTime<Utc>,
        urgent: bool,
    },

    StatusChanged {
        task_id: TaskId,
        org_id: OrgId,
        from: TaskStatus,
        to: TaskStatus,
    },

    Assigned {
        task_id: TaskId,
        org_id: OrgId,
        from: Option<UserId>,
        to: Option<UserId>,
    },

    Escalated {
        task_id: TaskId,
        org_id: OrgId,
        from_risk: RiskLevel,
        from_deadline: DateTime<Utc>,
        deadline: DateTime<Utc>,
    },
}

/// Audit action recorded for each event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AssessmentCreated,
    AssessmentArchived,
    AssessmentSubmittedForReview,
    ResponseSubmitted,
    AssessmentFinalized,
    TaskCreated,
    TaskStatusChanged,
    TaskAssigned,
    TaskEscalated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssessmentCreated => "ASSESSMENT_CREATED",
            Self::AssessmentArchived => "ASSESSMENT_ARCHIVED",
            Self::AssessmentSubmittedForReview => "ASSESSMENT_SUBMITTED_FOR_REVIEW",
            Self::ResponseSubmitted => "RESPONSE_SUBMITTED",
            Self::AssessmentFinalized => "ASSESSMENT_FINALIZED",
            Self::TaskCreated => "TASK_CREATED",
            Self::TaskStatusChanged => "TASK_STATUS_CHANGED",
            Self::TaskAssigned => "TASK_ASSIGNED",
            Self::TaskEscalated => "TASK_ESCALATED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audited entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Assessment,
    Response,
    RemediationTask,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assessment => "assessment",
            Self::Response => "response",
            Self::RemediationTask => "remediation_task",
        }
    }
}

impl DomainEvent {
    pub fn org_id(&self) -> &OrgId {
        match self {
            Self::Assessment(e) => match e {
                AssessmentEvent::Created { org_id, .. }
                | AssessmentEvent::Archived { org_id, .. }
                | AssessmentEvent::SubmittedForReview { org_id, .. }
                | AssessmentEvent::ResponseSubmitted { org_id, .. }
                | AssessmentEvent::Finalized { org_id, .. } => org_id,
            },
            Self::Task(e) => match e {
                TaskEvent::Created { org_id, .. }
                | TaskEvent::StatusChanged { org_id, .. }
                | TaskEvent::Assigned { org_id, .. }
                | TaskEvent::Escalated { org_id, .. } => org_id,
            },
        }
    }

    pub fn action(&self) -> AuditAction {
        match self {
            Self::Assessment(AssessmentEvent::Created { .. }) => AuditAction::AssessmentCreated,
            Self::Assessment(AssessmentEvent::Archived { .. }) => AuditAction::AssessmentArchived,
            Self::Assessment(AssessmentEvent::SubmittedForReview { .. }) => {
                AuditAction::AssessmentSubmittedForReview
            }
            Self::Assessment(AssessmentEvent::ResponseSubmitted { .. }) => AuditAction::ResponseSubmitted,
            Self::Assessment(AssessmentEvent::Finalized { .. }) => AuditAction::AssessmentFinalized,
            Self::Task(TaskEvent::Created { .. }) => AuditAction::TaskCreated,
            Self::Task(TaskEvent::StatusChanged { .. }) => AuditAction::TaskStatusChanged,
            Self::Task(TaskEvent::Assigned { .. }) => AuditAction::TaskAssigned,
            Self::Task(TaskEvent::Escalated { .. }) => AuditAction::TaskEscalated,
        }
    }

    /// Entity kind and id the event touches
    pub fn entity(&self) -> (EntityType, String) {
        match self {
            Self::Assessment(AssessmentEvent::ResponseSubmitted {
                assessment_id,
                control_id,
                ..
            }) => (EntityType::Response, format!("{assessment_id}/{control_id}")),
            Self::Assessment(e) => {
                let id = match e {
                    AssessmentEvent::Created { assessment_id, .. }
                    | AssessmentEvent::Archived { assessment_id, .. }
                    | AssessmentEvent::SubmittedForReview { assessment_id, .. }
                    | AssessmentEvent::ResponseSubmitted { assessment_id, .. }
                    | AssessmentEvent::Finalized { assessment_id, .. } => assessment_id,
                };
                (EntityType::Assessment, id.to_string())
            }
            Self::Task(e) => {
                let id = match e {
                    TaskEvent::Created { task_id, .. }
                    | TaskEvent::StatusChanged { task_id, .. }
                    | TaskEvent::Assigned { task_id, .. }
                    | TaskEvent::Escalated { task_id, .. } => task_id,
                };
                (EntityType::RemediationTask, id.to_string())
            }
        }
    }

    /// Old and new values as JSON, for the audit trail
    pub fn change_values(&self) -> (Option<serde_json::Value>, Option<serde_json::Value>) {
        use serde_json::json;

        match self {
            Self::Assessment(AssessmentEvent::Created { version, .. }) => {
                (None, Some(json!({ "status": AssessmentStatus::Draft, "version": version })))
            }
            Self::Assessment(AssessmentEvent::Archived { previous_status, .. }) => (
                Some(json!({ "status": previous_status })),
                Some(json!({ "status": AssessmentStatus::Archived })),
            ),
            Self::Assessment(AssessmentEvent::SubmittedForReview { .. }) => (
                Some(json!({ "status": AssessmentStatus::Draft })),
                Some(json!({ "status": AssessmentStatus::InReview })),
            ),
            Self::Assessment(AssessmentEvent::ResponseSubmitted { old_answer, new_answer, .. }) => (
                old_answer.map(|a| json!({ "answer": a })),
                Some(json!({ "answer": new_answer })),
            ),
            Self::Assessment(AssessmentEvent::Finalized { overall_score, gaps, .. }) => (
                None,
                Some(json!({
                    "status": AssessmentStatus::Finalized,
                    "overall_score": overall_score.to_string(),
                    "critical_gaps": gaps.critical,
                    "high_gaps": gaps.high,
                    "medium_gaps": gaps.medium,
                    "low_gaps": gaps.low,
                })),
            ),
            Self::Task(TaskEvent::Created {
                control_id,
                gap_type,
                risk_level,
                deadline,
                urgent,
                ..
            }) => (
                None,
                Some(json!({
                    "control_id": control_id,
                    "gap_type": gap_type,
                    "risk_level": risk_level,
                    "deadline": deadline,
                    "urgent": urgent,
                })),
            ),
            Self::Task(TaskEvent::StatusChanged { from, to, .. }) => {
                (Some(json!({ "status": from })), Some(json!({ "status": to })))
            }
            Self::Task(TaskEvent::Assigned { from, to, .. }) => {
                (Some(json!({ "owner_user_id": from })), Some(json!({ "owner_user_id": to })))
            }
            Self::Task(TaskEvent::Escalated { from_risk, from_deadline, deadline, .. }) => (
                Some(json!({ "risk_level": from_risk, "deadline": from_deadline, "urgent": false })),
                Some(json!({ "risk_level": RiskLevel::Critical, "deadline": deadline, "urgent": true })),
            ),
        }
    }
}
