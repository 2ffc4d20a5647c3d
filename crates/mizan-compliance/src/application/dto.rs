//! Data Transfer Objects
//!
//! Commands come in with raw strings where the caller may send anything;
//! parsing them is part of the use case. Views go out serializable.

use chrono::{DateTime, Utc};
use mizan_common::{AssessmentId, ControlId, OrgId, TaskId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Assessment, AssessmentStatus, RemediationTask, Response, TaskStatus};
use crate::domain::catalog::{Control, RiskLevel};
use crate::domain::scoring::{self, DomainScore, GapCounts};
use crate::domain::value_objects::{Answer, GapType, Language};

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponseCommand {
    pub assessment_id: AssessmentId,
    pub control_id: String,
    pub answer: String,
    pub na_justification: Option<String>,
    pub notes: Option<String>,
}

impl SubmitResponseCommand {
    pub fn new(assessment_id: &AssessmentId, control_id: &str, answer: &str) -> Self {
        Self {
            assessment_id: assessment_id.clone(),
            control_id: control_id.to_string(),
            answer: answer.to_string(),
            na_justification: None,
            notes: None,
        }
    }

    pub fn justified(mut self, justification: impl Into<String>) -> Self {
        self.na_justification = Some(justification.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeTaskStatusCommand {
    pub task_id: TaskId,
    pub status: String,
    pub notes: Option<String>,
    pub rejection_note: Option<String>,
}

impl ChangeTaskStatusCommand {
    pub fn new(task_id: &TaskId, status: &str) -> Self {
        Self {
            task_id: task_id.clone(),
            status: status.to_string(),
            notes: None,
            rejection_note: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_rejection_note(mut self, note: impl Into<String>) -> Self {
        self.rejection_note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTaskCommand {
    pub task_id: TaskId,
    /// `None` clears the assignment
    pub owner_user_id: Option<UserId>,
}

/// Task list filter; every set field must match
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub risk_level: Option<RiskLevel>,
    pub owner_user_id: Option<UserId>,
    pub control_id: Option<ControlId>,
    pub domain_number: Option<u8>,
    pub assessment_id: Option<AssessmentId>,
}

impl TaskFilter {
    pub fn matches(&self, task: &RemediationTask, domain_number: Option<u8>) -> bool {
        if let Some(status) = self.status {
            if task.status() != status {
                return false;
            }
        }
        if let Some(risk) = self.risk_level {
            if task.risk_level() != risk {
                return false;
            }
        }
        if let Some(owner) = &self.owner_user_id {
            if task.owner_user_id() != Some(owner) {
                return false;
            }
        }
        if let Some(control) = &self.control_id {
            if task.control_id() != control {
                return false;
            }
        }
        if let Some(domain) = self.domain_number {
            if domain_number != Some(domain) {
                return false;
            }
        }
        if let Some(assessment) = &self.assessment_id {
            if task.assessment_id() != assessment {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Views
// =============================================================================

/// Answered vs applicable controls, against the current branching result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub answered_count: usize,
    pub total_applicable: usize,
    pub percent_complete: Decimal,
}

impl Progress {
    pub fn new(answered_count: usize, total_applicable: usize) -> Self {
        Self {
            answered_count,
            total_applicable,
            percent_complete: scoring::percentage(
                Decimal::from(answered_count as u64),
                Decimal::from(total_applicable as u64),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentView {
    pub id: AssessmentId,
    pub org_id: OrgId,
    pub version: u32,
    pub status: AssessmentStatus,
    pub overall_score: Option<Decimal>,
    pub domain_scores: Option<Vec<DomainScore>>,
    pub gaps: Option<GapCounts>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub finalized_by: Option<UserId>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub responses: Vec<Response>,
    pub progress: Progress,
}

impl AssessmentView {
    pub fn new(assessment: &Assessment, progress: Progress) -> Self {
        Self {
            id: assessment.id().clone(),
            org_id: assessment.org_id().clone(),
            version: assessment.version(),
            status: assessment.status(),
            overall_score: assessment.overall_score(),
            domain_scores: assessment.domain_scores().map(<[DomainScore]>::to_vec),
            gaps: assessment.gaps(),
            created_by: assessment.created_by().clone(),
            created_at: assessment.created_at(),
            finalized_by: assessment.finalized_by().cloned(),
            finalized_at: assessment.finalized_at(),
            responses: assessment.responses().cloned().collect(),
            progress,
        }
    }
}

/// Row of `list_assessments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub id: AssessmentId,
    pub version: u32,
    pub status: AssessmentStatus,
    pub overall_score: Option<Decimal>,
    pub response_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Assessment> for AssessmentSummary {
    fn from(a: &Assessment) -> Self {
        Self {
            id: a.id().clone(),
            version: a.version(),
            status: a.status(),
            overall_score: a.overall_score(),
            response_count: a.response_count(),
            created_at: a.created_at(),
        }
    }
}

/// Applicable controls of one domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainControls {
    pub domain_number: u8,
    pub domain_name: String,
    pub controls: Vec<Control>,
}

/// Outcome of `submit_response`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseOutcome {
    pub response: Response,
    pub previous_answer: Option<Answer>,
    /// Task raised by this submission, if any
    pub task_created: Option<TaskId>,
    /// Existing task raised to an urgent stop by this submission
    pub task_escalated: Option<TaskId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub id: TaskId,
    pub org_id: OrgId,
    pub assessment_id: AssessmentId,
    pub control_id: ControlId,
    pub gap_type: GapType,
    pub risk_level: RiskLevel,
    pub status: TaskStatus,
    pub deadline: DateTime<Utc>,
    pub evidence_required_for_closure: bool,
    pub legal_basis: String,
    pub urgent: bool,
    pub owner_user_id: Option<UserId>,
    pub notes: Option<String>,
    pub last_rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub overdue: bool,
}

impl TaskView {
    pub fn new(task: &RemediationTask, now: DateTime<Utc>) -> Self {
        Self {
            id: task.id().clone(),
            org_id: task.org_id().clone(),
            assessment_id: task.assessment_id().clone(),
            control_id: task.control_id().clone(),
            gap_type: task.gap_type(),
            risk_level: task.risk_level(),
            status: task.status(),
            deadline: task.deadline(),
            evidence_required_for_closure: task.evidence_required_for_closure(),
            legal_basis: task.legal_basis().to_string(),
            urgent: task.is_urgent(),
            owner_user_id: task.owner_user_id().cloned(),
            notes: task.notes().map(str::to_string),
            last_rejection_note: task.last_rejection_note().map(str::to_string),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
            closed_at: task.closed_at(),
            overdue: task.is_overdue(now),
        }
    }
}

/// Where a guidance text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceSource {
    Cached,
    Generated,
    /// Generator failed; the text is a static placeholder
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceText {
    pub task_id: TaskId,
    pub text: String,
    pub source: GuidanceSource,
    pub language: Language,
    pub generated_at: Option<DateTime<Utc>>,
}
