//! Assessment application service
//!
//! Each mutating operation runs under the aggregate's lock as one unit:
//! load, validate, write, then audit. Events are drained before the write
//! so a stored aggregate never replays them. A response and the task it
//! raises are prepared before either is written; if the task write fails
//! the response is rolled back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mizan_common::{Actor, AssessmentId, OrgId, TaskId};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::audit::AuditRecorder;
use super::dto::*;
use crate::config::ComplianceConfig;
use crate::domain::aggregates::{Assessment, AssessmentStatus, RemediationTask, ResponseSubmission};
use crate::domain::branching::{self, BranchingEngine};
use crate::domain::catalog::{Control, ControlCatalog};
use crate::domain::profile::OrganizationProfile;
use crate::domain::scoring::{ScoringInput, ScoringService};
use crate::domain::value_objects::Answer;
use crate::infrastructure::{AggregateGuard, AggregateLocks};
use crate::ports::inbound::{AssessmentUseCases, UseCaseError};
use crate::ports::outbound::{AssessmentRepository, AuditSink, OrganizationDirectory, TaskRepository};

/// Assessment application service
pub struct AssessmentService {
    catalog: Arc<ControlCatalog>,
    config: Arc<ComplianceConfig>,
    assessments: Arc<dyn AssessmentRepository>,
    tasks: Arc<dyn TaskRepository>,
    directory: Arc<dyn OrganizationDirectory>,
    audit: AuditRecorder,
    locks: Arc<AggregateLocks>,
}

impl AssessmentService {
    pub fn new(
        catalog: Arc<ControlCatalog>,
        config: Arc<ComplianceConfig>,
        assessments: Arc<dyn AssessmentRepository>,
        tasks: Arc<dyn TaskRepository>,
        directory: Arc<dyn OrganizationDirectory>,
        audit_sink: Arc<dyn AuditSink>,
        locks: Arc<AggregateLocks>,
    ) -> Self {
        Self {
            catalog,
            config,
            assessments,
            tasks,
            directory,
            audit: AuditRecorder::new(audit_sink),
            locks,
        }
    }

    /// Profile of an onboarded organization
    async fn profile(&self, org_id: &OrgId) -> Result<OrganizationProfile, UseCaseError> {
        let org = self.directory.organization(org_id).await?
            .ok_or_else(|| UseCaseError::not_found("organization", org_id))?;

        match org.profile {
            Some(profile) if org.onboarding_completed => Ok(profile),
            _ => Err(UseCaseError::OnboardingIncomplete(org_id.clone())),
        }
    }

    /// Load an assessment visible to the actor
    async fn load(&self, actor: &Actor, id: &AssessmentId) -> Result<Assessment, UseCaseError> {
        self.assessments.find_by_id(id).await?
            .filter(|a| actor.in_org(a.org_id()))
            .ok_or_else(|| UseCaseError::not_found("assessment", id))
    }

    fn applicable(&self, profile: &OrganizationProfile) -> Vec<&Control> {
        let result = BranchingEngine::evaluate(profile);
        BranchingEngine::applicable_controls(&self.catalog, profile, &result)
    }

    fn progress(&self, assessment: &Assessment, profile: &OrganizationProfile) -> Progress {
        let applicable: HashSet<_> = self.applicable(profile).into_iter().map(|c| &c.id).collect();
        let answered = assessment
            .responses()
            .filter(|r| applicable.contains(&r.control_id))
            .count();
        Progress::new(answered, applicable.len())
    }

    async fn view(&self, assessment: &Assessment) -> Result<AssessmentView, UseCaseError> {
        let profile = self.profile(assessment.org_id()).await?;
        Ok(AssessmentView::new(assessment, self.progress(assessment, &profile)))
    }

    /// Work out the task write a response calls for, at most one task per
    /// (assessment, control). Nothing is stored here.
    async fn plan_task(
        &self,
        assessment: &Assessment,
        control: &Control,
        answer: Answer,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskPlan<'_>>, UseCaseError> {
        let suspension = answer == Answer::Yes && BranchingEngine::in_transfer_suspension_family(&control.id);
        let gap_type = answer.gap_type();
        if gap_type.is_none() && !suspension {
            return Ok(None);
        }

        if let Some(existing) = self.tasks.find_for_response(assessment.id(), &control.id).await? {
            if !suspension {
                return Ok(None);
            }
            let guard = self.locks.acquire(AggregateLocks::task_key(existing.id())).await;
            // Re-read under the task lock.
            let Some(mut task) = self.tasks.find_by_id(existing.id()).await? else {
                return Ok(None);
            };
            if !task.escalate_to_urgent(now) {
                tracing::debug!(
                    task_id = %task.id(),
                    status = %task.status(),
                    "transfer suspension: task already urgent or closed"
                );
                return Ok(None);
            }
            return Ok(Some(TaskPlan::Escalate(task, guard)));
        }

        let task = match gap_type {
            Some(gap_type) => RemediationTask::from_gap(
                assessment.org_id().clone(),
                assessment.id().clone(),
                control,
                gap_type,
                &self.config.deadlines,
                now,
            ),
            None => RemediationTask::transfer_suspension(
                assessment.org_id().clone(),
                assessment.id().clone(),
                control,
                now,
            ),
        };
        Ok(Some(TaskPlan::Create(task)))
    }

    /// Put back the assessment as it was before a failed submission
    async fn restore(&self, previous: &Assessment) {
        if let Err(e) = self.assessments.save(previous).await {
            tracing::error!(
                assessment_id = %previous.id(),
                error = %e,
                "failed to roll back response after task write failure"
            );
        }
    }
}

/// Task write prepared ahead of the response write
enum TaskPlan<'a> {
    Create(RemediationTask),
    /// Holds the task lock until the escalated task is stored
    Escalate(RemediationTask, AggregateGuard<'a>),
}

#[async_trait]
impl AssessmentUseCases for AssessmentService {
    async fn create_assessment(&self, actor: &Actor) -> Result<AssessmentView, UseCaseError> {
        let _guard = self.locks.acquire(AggregateLocks::org_key(&actor.org_id)).await;

        let profile = self.profile(&actor.org_id).await?;
        let now = Utc::now();

        let existing = self.assessments.find_by_org(&actor.org_id).await?;
        let version = existing.iter().map(Assessment::version).max().unwrap_or(0) + 1;

        let mut events = vec![];
        for previous in existing.iter().filter(|a| a.status() != AssessmentStatus::Archived) {
            let _prev_guard = self.locks.acquire(AggregateLocks::assessment_key(previous.id())).await;
            // Re-read under the assessment lock.
            let Some(mut current) = self.assessments.find_by_id(previous.id()).await? else {
                continue;
            };
            if current.status() == AssessmentStatus::Archived {
                continue;
            }
            current.archive(now)?;
            events.extend(current.take_events());
            self.assessments.save(&current).await?;
            tracing::info!(assessment_id = %current.id(), "assessment archived");
        }

        let mut assessment = Assessment::create(actor.org_id.clone(), version, actor.user_id.clone(), now);
        events.extend(assessment.take_events());
        self.assessments.save(&assessment).await?;

        tracing::info!(
            assessment_id = %assessment.id(),
            org_id = %actor.org_id,
            version,
            "assessment created"
        );
        self.audit.record_events(actor, events, now).await;

        Ok(AssessmentView::new(&assessment, self.progress(&assessment, &profile)))
    }

    async fn list_assessments(&self, actor: &Actor) -> Result<Vec<AssessmentSummary>, UseCaseError> {
        let mut assessments = self.assessments.find_by_org(&actor.org_id).await?;
        assessments.sort_by(|a, b| b.version().cmp(&a.version()));
        Ok(assessments.iter().map(AssessmentSummary::from).collect())
    }

    async fn get_assessment(&self, actor: &Actor, id: &AssessmentId) -> Result<AssessmentView, UseCaseError> {
        let assessment = self.load(actor, id).await?;
        self.view(&assessment).await
    }

    async fn submit_response(
        &self,
        actor: &Actor,
        command: SubmitResponseCommand,
    ) -> Result<ResponseOutcome, UseCaseError> {
        let _guard = self.locks.acquire(AggregateLocks::assessment_key(&command.assessment_id)).await;

        let mut assessment = self.load(actor, &command.assessment_id).await?;
        assessment.ensure_editable()?;

        let control = self.catalog.find(&command.control_id)
            .ok_or_else(|| UseCaseError::not_found("control", &command.control_id))?;
        let answer = command.answer.parse::<Answer>()
            .map_err(|e| UseCaseError::Validation(e.to_string()))?;

        let profile = self.profile(assessment.org_id()).await?;
        let now = Utc::now();

        let previous = assessment.clone();
        let change = assessment.submit_response(
            ResponseSubmission {
                control,
                answer,
                na_justification: command.na_justification,
                notes: command.notes,
                na_forbidden: BranchingEngine::na_forbidden(control, profile.org_type),
                min_justification_chars: self.config.na_justification_min_chars,
            },
            &actor.user_id,
            now,
        )?;
        let mut events = assessment.take_events();
        let plan = self.plan_task(&assessment, control, answer, now).await?;

        self.assessments.save(&assessment).await?;

        let mut task_created: Option<TaskId> = None;
        let mut task_escalated: Option<TaskId> = None;
        if let Some(plan) = plan {
            let (mut task, escalation_guard) = match plan {
                TaskPlan::Create(task) => (task, None),
                TaskPlan::Escalate(task, guard) => (task, Some(guard)),
            };
            let escalated = escalation_guard.is_some();
            let task_events = task.take_events();
            if let Err(e) = self.tasks.save(&task).await {
                self.restore(&previous).await;
                return Err(e.into());
            }
            drop(escalation_guard);
            events.extend(task_events);

            if escalated {
                tracing::warn!(
                    task_id = %task.id(),
                    assessment_id = %assessment.id(),
                    control_id = %control.id,
                    "transfer suspension escalated existing task"
                );
                task_escalated = Some(task.id().clone());
            } else {
                if task.is_urgent() {
                    tracing::warn!(
                        assessment_id = %assessment.id(),
                        control_id = %control.id,
                        "transfer suspension triggered"
                    );
                }
                tracing::info!(
                    task_id = %task.id(),
                    control_id = %control.id,
                    risk = %task.risk_level(),
                    deadline = %task.deadline(),
                    "remediation task created"
                );
                task_created = Some(task.id().clone());
            }
        }

        if control.id.as_str() == branching::DPIA_CONTROL && answer == Answer::No {
            // Dependent controls are only flagged in the log.
            tracing::info!(
                assessment_id = %assessment.id(),
                dependents = ?branching::DPIA_DEPENDENT_CONTROLS,
                "DPIA not conducted"
            );
        }

        tracing::info!(
            assessment_id = %assessment.id(),
            control_id = %control.id,
            answer = %answer,
            previous = ?change.previous_answer,
            "response submitted"
        );
        self.audit.record_events(actor, events, now).await;

        let response = assessment.response(&control.id)
            .cloned()
            .ok_or_else(|| UseCaseError::not_found("response", &control.id))?;

        Ok(ResponseOutcome {
            response,
            previous_answer: change.previous_answer,
            task_created,
            task_escalated,
        })
    }

    async fn finalize_assessment(&self, actor: &Actor, id: &AssessmentId) -> Result<AssessmentView, UseCaseError> {
        if !actor.role.can_finalize_assessments() {
            return Err(UseCaseError::Forbidden(format!("role {} cannot finalize assessments", actor.role)));
        }

        let _guard = self.locks.acquire(AggregateLocks::assessment_key(id)).await;
        let mut assessment = self.load(actor, id).await?;

        let inputs: Vec<ScoringInput<'_>> = assessment
            .responses()
            .filter_map(|r| match self.catalog.get(&r.control_id) {
                Some(control) => Some(ScoringInput::new(control, r.answer)),
                None => {
                    tracing::warn!(control_id = %r.control_id, "response for unknown control skipped");
                    None
                }
            })
            .collect();
        let summary = ScoringService::score(&inputs);

        let now = Utc::now();
        assessment.finalize(summary, &actor.user_id, now)?;
        let events = assessment.take_events();
        self.assessments.save(&assessment).await?;

        tracing::info!(
            assessment_id = %assessment.id(),
            score = ?assessment.overall_score(),
            "assessment finalized"
        );
        self.audit.record_events(actor, events, now).await;

        self.view(&assessment).await
    }

    async fn submit_for_review(&self, actor: &Actor, id: &AssessmentId) -> Result<AssessmentView, UseCaseError> {
        let _guard = self.locks.acquire(AggregateLocks::assessment_key(id)).await;
        let mut assessment = self.load(actor, id).await?;

        let now = Utc::now();
        assessment.submit_for_review(now)?;
        let events = assessment.take_events();
        self.assessments.save(&assessment).await?;

        tracing::info!(assessment_id = %assessment.id(), "assessment submitted for review");
        self.audit.record_events(actor, events, now).await;

        self.view(&assessment).await
    }

    async fn list_applicable_controls(&self, actor: &Actor) -> Result<Vec<DomainControls>, UseCaseError> {
        let profile = self.profile(&actor.org_id).await?;

        let mut grouped: BTreeMap<u8, Vec<Control>> = BTreeMap::new();
        for control in self.applicable(&profile) {
            grouped.entry(control.domain_number).or_default().push(control.clone());
        }

        Ok(grouped
            .into_iter()
            .map(|(domain_number, mut controls)| {
                controls.sort_by(|a, b| a.id.cmp(&b.id));
                DomainControls {
                    domain_number,
                    domain_name: self.catalog.domain_name(domain_number)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Domain {domain_number}")),
                    controls,
                }
            })
            .collect())
    }
}
