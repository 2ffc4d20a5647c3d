//! Remediation Task Aggregate
//!
//! Corrective action raised from a NO or PARTIAL response. Its workflow is
//! independent of the parent assessment's lifecycle.

use chrono::{DateTime, Duration, Utc};
use mizan_common::{AssessmentId, ControlId, OrgId, Role, TaskId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::catalog::{Control, RiskLevel};
use crate::domain::events::{DomainEvent, TaskEvent};
use crate::domain::value_objects::{DeadlinePolicy, GapType};

/// Remediation task aggregate root
#[derive(Clone, Debug)]
pub struct RemediationTask {
    id: TaskId,
    org_id: OrgId,
    assessment_id: AssessmentId,
    control_id: ControlId,
    gap_type: GapType,
    risk_level: RiskLevel,
    status: TaskStatus,
    deadline: DateTime<Utc>,
    evidence_required_for_closure: bool,
    legal_basis: String,
    urgent: bool,
    owner_user_id: Option<UserId>,
    notes: Option<String>,
    last_rejection_note: Option<String>,
    ai_guidance: Option<String>,
    ai_generated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    events: Vec<DomainEvent>,
}

impl RemediationTask {
    /// Task for a NO or PARTIAL answer, due per the risk-level policy
    pub fn from_gap(
        org_id: OrgId,
        assessment_id: AssessmentId,
        control: &Control,
        gap_type: GapType,
        policy: &DeadlinePolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let deadline = policy.deadline_for(control.risk_level, now);
        Self::create(org_id, assessment_id, control, gap_type, control.risk_level, deadline, false, now)
    }

    /// Urgent-stop task: CRITICAL, due immediately
    pub fn transfer_suspension(
        org_id: OrgId,
        assessment_id: AssessmentId,
        control: &Control,
        now: DateTime<Utc>,
    ) -> Self {
        Self::create(org_id, assessment_id, control, GapType::Gap, RiskLevel::Critical, now, true, now)
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        org_id: OrgId,
        assessment_id: AssessmentId,
        control: &Control,
        gap_type: GapType,
        risk_level: RiskLevel,
        deadline: DateTime<Utc>,
        urgent: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let id = TaskId::generate();

        let mut task = Self {
            id: id.clone(),
            org_id: org_id.clone(),
            assessment_id: assessment_id.clone(),
            control_id: control.id.clone(),
            gap_type,
            risk_level,
            status: TaskStatus::Open,
            deadline,
            evidence_required_for_closure: risk_level.requires_closure_evidence(),
            legal_basis: control.legal_basis(),
            urgent,
            owner_user_id: None,
            notes: None,
            last_rejection_note: None,
            ai_guidance: None,
            ai_generated_at: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
            events: vec![],
        };

        task.raise_event(DomainEvent::Task(TaskEvent::Created {
            task_id: id,
            org_id,
            assessment_id,
            control_id: control.id.clone(),
            gap_type,
            risk_level,
            deadline,
            urgent,
        }));

        task
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &TaskId { &self.id }
    pub fn org_id(&self) -> &OrgId { &self.org_id }
    pub fn assessment_id(&self) -> &AssessmentId { &self.assessment_id }
    pub fn control_id(&self) -> &ControlId { &self.control_id }
    pub fn gap_type(&self) -> GapType { self.gap_type }
    pub fn risk_level(&self) -> RiskLevel { self.risk_level }
    pub fn status(&self) -> TaskStatus { self.status }
    pub fn deadline(&self) -> DateTime<Utc> { self.deadline }
    pub fn evidence_required_for_closure(&self) -> bool { self.evidence_required_for_closure }
    pub fn legal_basis(&self) -> &str { &self.legal_basis }
    pub fn is_urgent(&self) -> bool { self.urgent }
    pub fn owner_user_id(&self) -> Option<&UserId> { self.owner_user_id.as_ref() }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }
    pub fn last_rejection_note(&self) -> Option<&str> { self.last_rejection_note.as_deref() }
    pub fn ai_guidance(&self) -> Option<&str> { self.ai_guidance.as_deref() }
    pub fn ai_generated_at(&self) -> Option<DateTime<Utc>> { self.ai_generated_at }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn closed_at(&self) -> Option<DateTime<Utc>> { self.closed_at }

    /// Past its deadline and not closed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.deadline < now
    }

    // =========================================================================
    // Business Operations
    // =========================================================================

    /// Apply a status change, checking the transition table and its guards.
    ///
    /// `evidence_attached` only matters for closure of evidence-gated tasks.
    pub fn transition(
        &mut self,
        request: &TransitionRequest,
        role: Role,
        evidence_attached: bool,
        now: DateTime<Utc>,
    ) -> Result<TaskStatus, TaskError> {
        let from = self.status;
        let to = request.to;

        if !from.can_transition_to(to) {
            return Err(TaskError::InvalidTransition { from, to });
        }

        let request_notes = non_blank(request.notes.as_deref());

        if from == TaskStatus::InProgress
            && to == TaskStatus::UnderReview
            && request_notes.is_none()
            && non_blank(self.notes.as_deref()).is_none()
        {
            return Err(TaskError::NotesRequired);
        }

        if to == TaskStatus::Closed {
            if !role.can_close_tasks() {
                return Err(TaskError::Forbidden { role, action: "close tasks" });
            }
            if self.evidence_required_for_closure && !evidence_attached {
                return Err(TaskError::EvidenceRequired);
            }
        }

        if to == TaskStatus::Deferred {
            if !role.can_defer_tasks() {
                return Err(TaskError::Forbidden { role, action: "defer tasks" });
            }
            if request_notes.is_none() {
                return Err(TaskError::JustificationRequired);
            }
        }

        let rejection = if from == TaskStatus::UnderReview && to == TaskStatus::InProgress {
            match non_blank(request.rejection_note.as_deref()) {
                Some(note) => Some(note.to_string()),
                None => return Err(TaskError::RejectionNoteRequired),
            }
        } else {
            None
        };

        if let Some(notes) = request_notes {
            self.notes = Some(notes.to_string());
        }
        if rejection.is_some() {
            self.last_rejection_note = rejection;
        }
        self.status = to;
        if to == TaskStatus::Closed {
            self.closed_at = Some(now);
        }
        self.touch(now);

        self.raise_event(DomainEvent::Task(TaskEvent::StatusChanged {
            task_id: self.id.clone(),
            org_id: self.org_id.clone(),
            from,
            to,
        }));

        Ok(from)
    }

    /// Set or clear the owner
    pub fn assign(&mut self, owner: Option<UserId>, now: DateTime<Utc>) {
        let from = std::mem::replace(&mut self.owner_user_id, owner.clone());
        self.touch(now);

        self.raise_event(DomainEvent::Task(TaskEvent::Assigned {
            task_id: self.id.clone(),
            org_id: self.org_id.clone(),
            from,
            to: owner,
        }));
    }

    /// Raise an existing task to an urgent stop: CRITICAL, due now, evidence
    /// gated. Returns false when there is nothing to raise.
    pub fn escalate_to_urgent(&mut self, now: DateTime<Utc>) -> bool {
        if self.urgent || self.status.is_terminal() {
            return false;
        }

        let from_risk = self.risk_level;
        let from_deadline = self.deadline;
        self.urgent = true;
        self.risk_level = RiskLevel::Critical;
        self.deadline = self.deadline.min(now);
        self.evidence_required_for_closure = true;
        self.touch(now);

        self.raise_event(DomainEvent::Task(TaskEvent::Escalated {
            task_id: self.id.clone(),
            org_id: self.org_id.clone(),
            from_risk,
            from_deadline,
            deadline: self.deadline,
        }));
        true
    }

    /// Cache generated guidance text
    pub fn record_guidance(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.ai_guidance = Some(text.into());
        self.ai_generated_at = Some(now);
        self.touch(now);
    }

    /// Cached guidance younger than `ttl`
    pub fn guidance_if_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> Option<&str> {
        match (&self.ai_guidance, self.ai_generated_at) {
            (Some(text), Some(at)) if now - at < ttl => Some(text),
            _ => None,
        }
    }

    // =========================================================================
    // Private
    // =========================================================================

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

// =============================================================================
// Supporting Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Open,
    InProgress,
    UnderReview,
    Closed,
    Deferred,
}

impl TaskStatus {
    /// Allowed next states
    pub fn allowed_transitions(&self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Open => &[InProgress, Deferred],
            InProgress => &[UnderReview, Deferred],
            UnderReview => &[Closed, InProgress, Deferred],
            Closed => &[],
            Deferred => &[Open, InProgress],
        }
    }

    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Closed => "CLOSED",
            Self::Deferred => "DEFERRED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "UNDER_REVIEW" => Ok(Self::UnderReview),
            "CLOSED" => Ok(Self::Closed),
            "DEFERRED" => Ok(Self::Deferred),
            other => Err(format!(
                "status must be one of OPEN, IN_PROGRESS, UNDER_REVIEW, CLOSED, DEFERRED (got {other:?})"
            )),
        }
    }
}

/// Requested status change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub to: TaskStatus,
    pub notes: Option<String>,
    pub rejection_note: Option<String>,
}

impl TransitionRequest {
    pub fn to(status: TaskStatus) -> Self {
        Self {
            to: status,
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

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("cannot move task from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("notes are required before submitting for review")]
    NotesRequired,
    #[error("role {role} cannot {action}")]
    Forbidden { role: Role, action: &'static str },
    #[error("closing this task requires at least one evidence file")]
    EvidenceRequired,
    #[error("deferring a task requires a justification in the notes")]
    JustificationRequired,
    #[error("sending a task back requires a rejection note")]
    RejectionNoteRequired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ControlSource;

    fn control(risk: RiskLevel) -> Control {
        Control::new("PDPL-T.1", ControlSource::Pdpl, 6, "Adequacy", risk, 10, 5)
            .unwrap()
            .cite("PDPL Art. 29")
            .cite("Transfer Regulation Art. 2")
    }

    fn task(risk: RiskLevel) -> RemediationTask {
        let mut t = RemediationTask::from_gap(
            OrgId::new("org-1").unwrap(),
            AssessmentId::new("a-1").unwrap(),
            &control(risk),
            GapType::Gap,
            &DeadlinePolicy::default(),
            Utc::now(),
        );
        t.take_events();
        t
    }

    fn to_under_review(t: &mut RemediationTask) {
        let now = Utc::now();
        t.transition(&TransitionRequest::to(TaskStatus::InProgress), Role::Staff, false, now).unwrap();
        t.transition(
            &TransitionRequest::to(TaskStatus::UnderReview).with_notes("policy drafted"),
            Role::Staff,
            false,
            now,
        )
        .unwrap();
    }

    #[test]
    fn test_gap_task_fields() {
        let now = Utc::now();
        let t = RemediationTask::from_gap(
            OrgId::new("org-1").unwrap(),
            AssessmentId::new("a-1").unwrap(),
            &control(RiskLevel::Critical),
            GapType::Partial,
            &DeadlinePolicy::default(),
            now,
        );
        assert_eq!(t.deadline(), now + Duration::days(30));
        assert!(t.evidence_required_for_closure());
        assert_eq!(t.legal_basis(), "PDPL Art. 29; Transfer Regulation Art. 2");
        assert_eq!(t.status(), TaskStatus::Open);
        assert!(!t.is_urgent());
    }

    #[test]
    fn test_transfer_suspension_due_now() {
        let now = Utc::now();
        let t = RemediationTask::transfer_suspension(
            OrgId::new("org-1").unwrap(),
            AssessmentId::new("a-1").unwrap(),
            &control(RiskLevel::Medium),
            now,
        );
        assert_eq!(t.risk_level(), RiskLevel::Critical);
        assert_eq!(t.deadline(), now);
        assert!(t.is_urgent());
        assert!(t.evidence_required_for_closure());
    }

    #[test]
    fn test_transition_table() {
        use TaskStatus::*;
        let all = [Open, InProgress, UnderReview, Closed, Deferred];
        for to in all {
            assert!(!Closed.can_transition_to(to));
        }
        let from_open: Vec<_> = all.into_iter().filter(|s| Open.can_transition_to(*s)).collect();
        assert_eq!(from_open, vec![InProgress, Deferred]);
    }

    #[test]
    fn test_open_to_closed_is_invalid() {
        let mut t = task(RiskLevel::Low);
        let err = t
            .transition(&TransitionRequest::to(TaskStatus::Closed), Role::Admin, true, Utc::now())
            .unwrap_err();
        assert_eq!(err, TaskError::InvalidTransition { from: TaskStatus::Open, to: TaskStatus::Closed });
    }

    #[test]
    fn test_review_needs_notes() {
        let mut t = task(RiskLevel::Low);
        let now = Utc::now();
        t.transition(&TransitionRequest::to(TaskStatus::InProgress), Role::Staff, false, now).unwrap();
        assert_eq!(
            t.transition(&TransitionRequest::to(TaskStatus::UnderReview), Role::Staff, false, now),
            Err(TaskError::NotesRequired)
        );
        assert_eq!(
            t.transition(&TransitionRequest::to(TaskStatus::UnderReview).with_notes("  "), Role::Staff, false, now),
            Err(TaskError::NotesRequired)
        );
    }

    #[test]
    fn test_close_guards() {
        let mut t = task(RiskLevel::Critical);
        to_under_review(&mut t);
        let close = TransitionRequest::to(TaskStatus::Closed);

        assert!(matches!(
            t.transition(&close, Role::Staff, true, Utc::now()),
            Err(TaskError::Forbidden { .. })
        ));
        assert_eq!(
            t.transition(&close, Role::ComplianceOfficer, false, Utc::now()),
            Err(TaskError::EvidenceRequired)
        );
        t.transition(&close, Role::ComplianceOfficer, true, Utc::now()).unwrap();
        assert_eq!(t.status(), TaskStatus::Closed);
        assert!(t.closed_at().is_some());
        assert!(!t.is_overdue(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_low_risk_closes_without_evidence() {
        let mut t = task(RiskLevel::Low);
        to_under_review(&mut t);
        t.transition(&TransitionRequest::to(TaskStatus::Closed), Role::Dpo, false, Utc::now()).unwrap();
    }

    #[test]
    fn test_defer_guards() {
        let mut t = task(RiskLevel::Medium);
        let defer = TransitionRequest::to(TaskStatus::Deferred);
        assert!(matches!(
            t.transition(&defer, Role::Staff, false, Utc::now()),
            Err(TaskError::Forbidden { .. })
        ));
        assert_eq!(
            t.transition(&defer, Role::Dpo, false, Utc::now()),
            Err(TaskError::JustificationRequired)
        );
        t.transition(&defer.with_notes("budget next quarter"), Role::Dpo, false, Utc::now()).unwrap();
        assert_eq!(t.notes(), Some("budget next quarter"));
    }

    #[test]
    fn test_rejection_requires_note() {
        let mut t = task(RiskLevel::High);
        to_under_review(&mut t);
        let back = TransitionRequest::to(TaskStatus::InProgress);
        assert_eq!(
            t.transition(&back, Role::ComplianceOfficer, false, Utc::now()),
            Err(TaskError::RejectionNoteRequired)
        );
        t.transition(&back.with_rejection_note("missing signature"), Role::ComplianceOfficer, false, Utc::now())
            .unwrap();
        assert_eq!(t.last_rejection_note(), Some("missing signature"));
        assert_eq!(t.status(), TaskStatus::InProgress);
    }

    #[test]
    fn test_status_change_raises_event() {
        let mut t = task(RiskLevel::Low);
        t.transition(&TransitionRequest::to(TaskStatus::InProgress), Role::Staff, false, Utc::now()).unwrap();
        let events = t.take_events();
        assert!(matches!(
            events.as_slice(),
            [DomainEvent::Task(TaskEvent::StatusChanged {
                from: TaskStatus::Open,
                to: TaskStatus::InProgress,
                ..
            })]
        ));
    }

    #[test]
    fn test_escalate_to_urgent() {
        let mut t = task(RiskLevel::Medium);
        let now = Utc::now();
        assert!(t.escalate_to_urgent(now));
        assert!(t.is_urgent());
        assert_eq!(t.risk_level(), RiskLevel::Critical);
        assert_eq!(t.deadline(), now);
        assert!(t.evidence_required_for_closure());
        assert!(matches!(
            t.take_events().as_slice(),
            [DomainEvent::Task(TaskEvent::Escalated { from_risk: RiskLevel::Medium, .. })]
        ));

        assert!(!t.escalate_to_urgent(now + Duration::hours(1)));
        assert!(t.take_events().is_empty());
    }

    #[test]
    fn test_closed_task_is_not_escalated() {
        let mut t = task(RiskLevel::Low);
        to_under_review(&mut t);
        t.transition(&TransitionRequest::to(TaskStatus::Closed), Role::Dpo, false, Utc::now()).unwrap();
        t.take_events();

        assert!(!t.escalate_to_urgent(Utc::now()));
        assert_eq!(t.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn test_guidance_ttl() {
        let mut t = task(RiskLevel::Low);
        let now = Utc::now();
        assert!(t.guidance_if_fresh(Duration::hours(24), now).is_none());
        t.record_guidance("Draft a transfer register", now);
        assert_eq!(t.guidance_if_fresh(Duration::hours(24), now + Duration::hours(23)), Some("Draft a transfer register"));
        assert!(t.guidance_if_fresh(Duration::hours(24), now + Duration::hours(25)).is_none());
    }

    #[test]
    fn test_assign_and_clear() {
        let mut t = task(RiskLevel::Low);
        let owner = UserId::new("user-9").unwrap();
        t.assign(Some(owner.clone()), Utc::now());
        assert_eq!(t.owner_user_id(), Some(&owner));
        t.assign(None, Utc::now());
        assert!(t.owner_user_id().is_none());
    }
}
