//! Assessment Aggregate
//!
//! One versioned questionnaire run for an organization, owning its
//! responses. DRAFT -> IN_REVIEW -> FINALIZED, with ARCHIVED reachable from
//! any other state when a newer assessment supersedes it.

use chrono::{DateTime, Utc};
use mizan_common::{AssessmentId, ControlId, OrgId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::catalog::Control;
use crate::domain::events::{AssessmentEvent, DomainEvent};
use crate::domain::scoring::{DomainScore, GapCounts, ScoreSummary};
use crate::domain::value_objects::Answer;

/// Assessment aggregate root
#[derive(Clone, Debug)]
pub struct Assessment {
    id: AssessmentId,
    org_id: OrgId,
    version: u32,
    status: AssessmentStatus,
    overall_score: Option<Decimal>,
    domain_scores: Option<Vec<DomainScore>>,
    gaps: Option<GapCounts>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finalized_by: Option<UserId>,
    finalized_at: Option<DateTime<Utc>>,
    responses: BTreeMap<ControlId, Response>,
    events: Vec<DomainEvent>,
}

impl Assessment {
    /// Create a new DRAFT assessment
    pub fn create(org_id: OrgId, version: u32, created_by: UserId, now: DateTime<Utc>) -> Self {
        let id = AssessmentId::generate();

        let mut assessment = Self {
            id: id.clone(),
            org_id: org_id.clone(),
            version,
            status: AssessmentStatus::Draft,
            overall_score: None,
            domain_scores: None,
            gaps: None,
            created_by,
            created_at: now,
            updated_at: now,
            finalized_by: None,
            finalized_at: None,
            responses: BTreeMap::new(),
            events: vec![],
        };

        assessment.raise_event(DomainEvent::Assessment(AssessmentEvent::Created {
            assessment_id: id,
            org_id,
            version,
            created_at: now,
        }));

        assessment
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &AssessmentId { &self.id }
    pub fn org_id(&self) -> &OrgId { &self.org_id }
    pub fn version(&self) -> u32 { self.version }
    pub fn status(&self) -> AssessmentStatus { self.status }
    pub fn overall_score(&self) -> Option<Decimal> { self.overall_score }
    pub fn domain_scores(&self) -> Option<&[DomainScore]> { self.domain_scores.as_deref() }
    pub fn gaps(&self) -> Option<GapCounts> { self.gaps }
    pub fn created_by(&self) -> &UserId { &self.created_by }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn finalized_by(&self) -> Option<&UserId> { self.finalized_by.as_ref() }
    pub fn finalized_at(&self) -> Option<DateTime<Utc>> { self.finalized_at }
    pub fn is_editable(&self) -> bool { self.status.is_editable() }

    pub fn response(&self, control_id: &ControlId) -> Option<&Response> {
        self.responses.get(control_id)
    }

    /// Responses ordered by control ID
    pub fn responses(&self) -> impl Iterator<Item = &Response> {
        self.responses.values()
    }

    pub fn response_count(&self) -> usize {
        self.responses.len()
    }

    // =========================================================================
    // Business Operations
    // =========================================================================

    /// Fail with `Locked` unless responses may still change
    pub fn ensure_editable(&self) -> Result<(), AssessmentError> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(AssessmentError::Locked { status: self.status })
        }
    }

    /// Create or update the response for one control
    pub fn submit_response(
        &mut self,
        submission: ResponseSubmission<'_>,
        answered_by: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ResponseChange, AssessmentError> {
        self.ensure_editable()?;

        let control = submission.control;
        let na_justification = if submission.answer == Answer::Na {
            if submission.na_forbidden {
                return Err(AssessmentError::MandatoryControl(control.id.clone()));
            }
            let text = submission
                .na_justification
                .map(|s| s.trim().to_string())
                .unwrap_or_default();
            if text.chars().count() < submission.min_justification_chars {
                return Err(AssessmentError::JustificationTooShort {
                    min: submission.min_justification_chars,
                });
            }
            Some(text)
        } else {
            None
        };

        let points_earned = control.points_for(submission.answer);
        let notes = submission.notes.filter(|n| !n.trim().is_empty());

        let previous_answer = match self.responses.get_mut(&control.id) {
            Some(existing) => {
                let previous = existing.answer;
                existing.answer = submission.answer;
                existing.na_justification = na_justification;
                existing.notes = notes;
                existing.points_earned = points_earned;
                existing.last_modified_by = answered_by.clone();
                existing.last_modified_at = now;
                Some(previous)
            }
            None => {
                self.responses.insert(
                    control.id.clone(),
                    Response {
                        control_id: control.id.clone(),
                        answer: submission.answer,
                        na_justification,
                        notes,
                        points_earned,
                        answered_by: answered_by.clone(),
                        answered_at: now,
                        last_modified_by: answered_by.clone(),
                        last_modified_at: now,
                    },
                );
                None
            }
        };
        self.touch(now);

        self.raise_event(DomainEvent::Assessment(AssessmentEvent::ResponseSubmitted {
            assessment_id: self.id.clone(),
            org_id: self.org_id.clone(),
            control_id: control.id.clone(),
            old_answer: previous_answer,
            new_answer: submission.answer,
        }));

        Ok(ResponseChange {
            previous_answer,
            answer: submission.answer,
        })
    }

    /// DRAFT -> IN_REVIEW
    pub fn submit_for_review(&mut self, now: DateTime<Utc>) -> Result<(), AssessmentError> {
        if self.status != AssessmentStatus::Draft {
            return Err(AssessmentError::InvalidStatus {
                status: self.status,
                action: "submit for review",
            });
        }

        self.status = AssessmentStatus::InReview;
        self.touch(now);

        self.raise_event(DomainEvent::Assessment(AssessmentEvent::SubmittedForReview {
            assessment_id: self.id.clone(),
            org_id: self.org_id.clone(),
        }));

        Ok(())
    }

    /// Lock the assessment and record its official score
    pub fn finalize(
        &mut self,
        summary: ScoreSummary,
        finalized_by: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), AssessmentError> {
        if !self.is_editable() {
            return Err(AssessmentError::InvalidStatus {
                status: self.status,
                action: "finalize",
            });
        }

        self.status = AssessmentStatus::Finalized;
        self.overall_score = Some(summary.overall_score);
        self.domain_scores = Some(summary.domain_scores);
        self.gaps = Some(summary.gaps);
        self.finalized_by = Some(finalized_by.clone());
        self.finalized_at = Some(now);
        self.touch(now);

        self.raise_event(DomainEvent::Assessment(AssessmentEvent::Finalized {
            assessment_id: self.id.clone(),
            org_id: self.org_id.clone(),
            overall_score: summary.overall_score,
            gaps: summary.gaps,
            finalized_at: now,
        }));

        Ok(())
    }

    /// Supersede this assessment
    pub fn archive(&mut self, now: DateTime<Utc>) -> Result<(), AssessmentError> {
        if self.status == AssessmentStatus::Archived {
            return Err(AssessmentError::InvalidStatus {
                status: self.status,
                action: "archive",
            });
        }

        let previous_status = self.status;
        self.status = AssessmentStatus::Archived;
        self.touch(now);

        self.raise_event(DomainEvent::Assessment(AssessmentEvent::Archived {
            assessment_id: self.id.clone(),
            org_id: self.org_id.clone(),
            previous_status,
        }));

        Ok(())
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

// =============================================================================
// Supporting Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentStatus {
    Draft,
    InReview,
    Finalized,
    Archived,
}

impl AssessmentStatus {
    /// Responses may change only in DRAFT and IN_REVIEW
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::InReview)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::InReview => "IN_REVIEW",
            Self::Finalized => "FINALIZED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-control answer inside an assessment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub control_id: ControlId,
    pub answer: Answer,
    pub na_justification: Option<String>,
    pub notes: Option<String>,
    /// Derived from the answer and the control's points
    pub points_earned: u32,
    pub answered_by: UserId,
    pub answered_at: DateTime<Utc>,
    pub last_modified_by: UserId,
    pub last_modified_at: DateTime<Utc>,
}

/// Input to `Assessment::submit_response`
#[derive(Debug, Clone)]
pub struct ResponseSubmission<'a> {
    pub control: &'a Control,
    pub answer: Answer,
    pub na_justification: Option<String>,
    pub notes: Option<String>,
    /// N/A is not accepted for this control and organization
    pub na_forbidden: bool,
    pub min_justification_chars: usize,
}

/// Outcome of a response upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseChange {
    pub previous_answer: Option<Answer>,
    pub answer: Answer,
}

impl ResponseChange {
    pub fn is_new(&self) -> bool {
        self.previous_answer.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error("assessment is {status} and can no longer be edited")]
    Locked { status: AssessmentStatus },
    #[error("cannot {action} an assessment in status {status}")]
    InvalidStatus { status: AssessmentStatus, action: &'static str },
    #[error("control {0} is mandatory for this organization type; N/A is not accepted")]
    MandatoryControl(ControlId),
    #[error("N/A justification must be at least {min} characters")]
    JustificationTooShort { min: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{ControlSource, RiskLevel};
    use crate::domain::scoring::{ScoringInput, ScoringService};

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn control() -> Control {
        Control::new("PDPL-G.1", ControlSource::Pdpl, 1, "Privacy policy", RiskLevel::High, 8, 4).unwrap()
    }

    fn submission(control: &Control, answer: Answer) -> ResponseSubmission<'_> {
        ResponseSubmission {
            control,
            answer,
            na_justification: None,
            notes: None,
            na_forbidden: false,
            min_justification_chars: 20,
        }
    }

    fn draft() -> Assessment {
        let mut a = Assessment::create(OrgId::new("org-1").unwrap(), 1, user(), Utc::now());
        a.take_events();
        a
    }

    #[test]
    fn test_create_raises_event() {
        let mut a = Assessment::create(OrgId::new("org-1").unwrap(), 3, user(), Utc::now());
        assert_eq!(a.status(), AssessmentStatus::Draft);
        assert_eq!(a.version(), 3);
        assert!(a.overall_score().is_none());
        let events = a.take_events();
        assert!(matches!(
            events.as_slice(),
            [DomainEvent::Assessment(AssessmentEvent::Created { version: 3, .. })]
        ));
    }

    #[test]
    fn test_resubmit_updates_in_place() {
        let control = control();
        let mut a = draft();
        let first = a.submit_response(submission(&control, Answer::No), &user(), Utc::now()).unwrap();
        assert!(first.is_new());

        let second = a.submit_response(submission(&control, Answer::Yes), &user(), Utc::now()).unwrap();
        assert_eq!(second.previous_answer, Some(Answer::No));
        assert_eq!(a.response_count(), 1);
        assert_eq!(a.response(&control.id).unwrap().points_earned, 8);
    }

    #[test]
    fn test_na_requires_justification() {
        let control = control();
        let mut a = draft();
        let mut sub = submission(&control, Answer::Na);
        sub.na_justification = Some("too short".into());
        assert_eq!(
            a.submit_response(sub, &user(), Utc::now()),
            Err(AssessmentError::JustificationTooShort { min: 20 })
        );

        let mut sub = submission(&control, Answer::Na);
        sub.na_justification = Some("We do not publish any public-facing services".into());
        a.submit_response(sub, &user(), Utc::now()).unwrap();
        assert_eq!(a.response(&control.id).unwrap().points_earned, 0);
    }

    #[test]
    fn test_mandatory_checked_before_justification() {
        let control = control();
        let mut a = draft();
        let mut sub = submission(&control, Answer::Na);
        sub.na_forbidden = true;
        sub.na_justification = Some("A perfectly adequate justification text".into());
        assert!(matches!(
            a.submit_response(sub, &user(), Utc::now()),
            Err(AssessmentError::MandatoryControl(_))
        ));
        assert_eq!(a.response_count(), 0);
    }

    #[test]
    fn test_finalize_locks() {
        let control = control();
        let mut a = draft();
        a.submit_response(submission(&control, Answer::Partial), &user(), Utc::now()).unwrap();

        let inputs: Vec<_> = a
            .responses()
            .map(|r| ScoringInput::new(&control, r.answer))
            .collect();
        let summary = ScoringService::score(&inputs);
        a.finalize(summary.clone(), &user(), Utc::now()).unwrap();

        assert_eq!(a.status(), AssessmentStatus::Finalized);
        assert_eq!(a.overall_score(), Some(summary.overall_score));
        assert!(matches!(
            a.submit_response(submission(&control, Answer::Yes), &user(), Utc::now()),
            Err(AssessmentError::Locked { .. })
        ));
        assert!(matches!(
            a.finalize(summary, &user(), Utc::now()),
            Err(AssessmentError::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_submit_for_review_only_from_draft() {
        let mut a = draft();
        a.submit_for_review(Utc::now()).unwrap();
        assert_eq!(a.status(), AssessmentStatus::InReview);
        assert!(a.is_editable());
        assert!(a.submit_for_review(Utc::now()).is_err());
    }

    #[test]
    fn test_archive_from_any_live_state() {
        let mut a = draft();
        a.archive(Utc::now()).unwrap();
        assert_eq!(a.status(), AssessmentStatus::Archived);
        assert!(a.archive(Utc::now()).is_err());
    }
}
