//! Remediation application service

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mizan_common::{Actor, TaskId};
use std::sync::Arc;

use super::audit::AuditRecorder;
use super::dto::*;
use crate::domain::aggregates::{RemediationTask, TaskStatus, TransitionRequest};
use crate::domain::catalog::ControlCatalog;
use crate::infrastructure::AggregateLocks;
use crate::ports::inbound::{RemediationUseCases, UseCaseError};
use crate::ports::outbound::{AuditSink, EvidenceLocator, OrganizationDirectory, TaskRepository};

/// Remediation task application service
pub struct RemediationService {
    catalog: Arc<ControlCatalog>,
    tasks: Arc<dyn TaskRepository>,
    evidence: Arc<dyn EvidenceLocator>,
    directory: Arc<dyn OrganizationDirectory>,
    audit: AuditRecorder,
    locks: Arc<AggregateLocks>,
}

impl RemediationService {
    pub fn new(
        catalog: Arc<ControlCatalog>,
        tasks: Arc<dyn TaskRepository>,
        evidence: Arc<dyn EvidenceLocator>,
        directory: Arc<dyn OrganizationDirectory>,
        audit_sink: Arc<dyn AuditSink>,
        locks: Arc<AggregateLocks>,
    ) -> Self {
        Self {
            catalog,
            tasks,
            evidence,
            directory,
            audit: AuditRecorder::new(audit_sink),
            locks,
        }
    }

    async fn load(&self, actor: &Actor, id: &TaskId) -> Result<RemediationTask, UseCaseError> {
        self.tasks.find_by_id(id).await?
            .filter(|t| actor.in_org(t.org_id()))
            .ok_or_else(|| UseCaseError::not_found("task", id))
    }

    fn domain_of(&self, task: &RemediationTask) -> Option<u8> {
        self.catalog.get(task.control_id()).map(|c| c.domain_number)
    }
}

/// CRITICAL first, then the earliest deadline
fn sort_by_urgency(tasks: &mut [RemediationTask]) {
    tasks.sort_by(|a, b| {
        a.risk_level().priority()
            .cmp(&b.risk_level().priority())
            .then_with(|| a.deadline().cmp(&b.deadline()))
    });
}

#[async_trait]
impl RemediationUseCases for RemediationService {
    async fn list_tasks(&self, actor: &Actor, filter: TaskFilter) -> Result<Vec<TaskView>, UseCaseError> {
        let mut tasks: Vec<_> = self.tasks.find_by_org(&actor.org_id).await?
            .into_iter()
            .filter(|t| filter.matches(t, self.domain_of(t)))
            .collect();
        sort_by_urgency(&mut tasks);

        let now = Utc::now();
        Ok(tasks.iter().map(|t| TaskView::new(t, now)).collect())
    }

    async fn get_task(&self, actor: &Actor, id: &TaskId) -> Result<TaskView, UseCaseError> {
        let task = self.load(actor, id).await?;
        Ok(TaskView::new(&task, Utc::now()))
    }

    async fn change_task_status(
        &self,
        actor: &Actor,
        command: ChangeTaskStatusCommand,
    ) -> Result<TaskView, UseCaseError> {
        let to = command.status.parse::<TaskStatus>().map_err(UseCaseError::Validation)?;

        let _guard = self.locks.acquire(AggregateLocks::task_key(&command.task_id)).await;
        let mut task = self.load(actor, &command.task_id).await?;

        let evidence_attached = if to == TaskStatus::Closed && task.evidence_required_for_closure() {
            self.evidence.has_evidence(task.id()).await?
        } else {
            false
        };

        let request = TransitionRequest {
            to,
            notes: command.notes,
            rejection_note: command.rejection_note,
        };
        let now = Utc::now();
        let from = task.transition(&request, actor.role, evidence_attached, now)?;
        let events = task.take_events();
        self.tasks.save(&task).await?;

        tracing::info!(task_id = %task.id(), %from, %to, "task status changed");
        self.audit.record_events(actor, events, now).await;

        Ok(TaskView::new(&task, now))
    }

    async fn assign_task(&self, actor: &Actor, command: AssignTaskCommand) -> Result<TaskView, UseCaseError> {
        if !actor.role.can_assign_tasks() {
            return Err(UseCaseError::Forbidden(format!("role {} cannot assign tasks", actor.role)));
        }

        let _guard = self.locks.acquire(AggregateLocks::task_key(&command.task_id)).await;
        let mut task = self.load(actor, &command.task_id).await?;

        if let Some(owner) = &command.owner_user_id {
            if !self.directory.is_member(task.org_id(), owner).await? {
                return Err(UseCaseError::InvalidUser(format!("{owner} is not a member of this organization")));
            }
        }

        let now = Utc::now();
        task.assign(command.owner_user_id, now);
        let events = task.take_events();
        self.tasks.save(&task).await?;

        tracing::info!(task_id = %task.id(), owner = ?task.owner_user_id(), "task assigned");
        self.audit.record_events(actor, events, now).await;

        Ok(TaskView::new(&task, now))
    }

    async fn overdue_tasks(&self, actor: &Actor, now: DateTime<Utc>) -> Result<Vec<TaskView>, UseCaseError> {
        let mut tasks: Vec<_> = self.tasks.find_by_org(&actor.org_id).await?
            .into_iter()
            .filter(|t| t.is_overdue(now))
            .collect();
        tasks.sort_by_key(|t| t.deadline());
        Ok(tasks.iter().map(|t| TaskView::new(t, now)).collect())
    }
}
