//! In-memory repository implementations

use async_trait::async_trait;
use mizan_common::{AssessmentId, ControlId, OrgId, TaskId, UserId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::domain::aggregates::{Assessment, RemediationTask};
use crate::domain::profile::OrganizationProfile;
use crate::ports::outbound::{
    AssessmentRepository, OrganizationDirectory, OrganizationRecord, RepositoryError, TaskRepository,
};

/// In-memory assessment repository
#[derive(Default)]
pub struct InMemoryAssessmentRepository {
    assessments: RwLock<HashMap<AssessmentId, Assessment>>,
}

impl InMemoryAssessmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryAssessmentRepository {
    async fn find_by_id(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        Ok(self.assessments.read().get(id).cloned())
    }

    async fn find_by_org(&self, org_id: &OrgId) -> Result<Vec<Assessment>, RepositoryError> {
        Ok(self.assessments.read()
            .values()
            .filter(|a| a.org_id() == org_id)
            .cloned()
            .collect())
    }

    async fn save(&self, assessment: &Assessment) -> Result<(), RepositoryError> {
        self.assessments.write().insert(assessment.id().clone(), assessment.clone());
        Ok(())
    }
}

/// In-memory remediation task repository
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<HashMap<TaskId, RemediationTask>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<RemediationTask>, RepositoryError> {
        Ok(self.tasks.read().get(id).cloned())
    }

    async fn find_for_response(
        &self,
        assessment_id: &AssessmentId,
        control_id: &ControlId,
    ) -> Result<Option<RemediationTask>, RepositoryError> {
        Ok(self.tasks.read()
            .values()
            .find(|t| t.assessment_id() == assessment_id && t.control_id() == control_id)
            .cloned())
    }

    async fn find_by_org(&self, org_id: &OrgId) -> Result<Vec<RemediationTask>, RepositoryError> {
        Ok(self.tasks.read()
            .values()
            .filter(|t| t.org_id() == org_id)
            .cloned()
            .collect())
    }

    async fn save(&self, task: &RemediationTask) -> Result<(), RepositoryError> {
        self.tasks.write().insert(task.id().clone(), task.clone());
        Ok(())
    }
}

/// In-memory organization directory
#[derive(Default)]
pub struct InMemoryOrganizationDirectory {
    organizations: RwLock<HashMap<OrgId, OrganizationRecord>>,
    members: RwLock<HashMap<OrgId, HashSet<UserId>>>,
}

impl InMemoryOrganizationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organization that has finished onboarding
    pub fn onboard(&self, org_id: &OrgId, name: &str, profile: OrganizationProfile) {
        self.upsert(OrganizationRecord {
            org_id: org_id.clone(),
            name: name.to_string(),
            profile: Some(profile),
            onboarding_completed: true,
        });
    }

    pub fn upsert(&self, record: OrganizationRecord) {
        self.organizations.write().insert(record.org_id.clone(), record);
    }

    pub fn add_member(&self, org_id: &OrgId, user_id: &UserId) {
        self.members.write().entry(org_id.clone()).or_default().insert(user_id.clone());
    }
}

#[async_trait]
impl OrganizationDirectory for InMemoryOrganizationDirectory {
    async fn organization(&self, org_id: &OrgId) -> Result<Option<OrganizationRecord>, RepositoryError> {
        Ok(self.organizations.read().get(org_id).cloned())
    }

    async fn is_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, RepositoryError> {
        Ok(self.members.read()
            .get(org_id)
            .map(|m| m.contains(user_id))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::OrgType;
    use chrono::Utc;

    #[tokio::test]
    async fn test_find_by_org_is_scoped() {
        let repo = InMemoryAssessmentRepository::new();
        let org = OrgId::new("org-1").unwrap();
        let user = UserId::new("u-1").unwrap();
        for version in [1, 3, 2] {
            repo.save(&Assessment::create(org.clone(), version, user.clone(), Utc::now())).await.unwrap();
        }
        let mut versions: Vec<_> = repo.find_by_org(&org).await.unwrap().iter().map(Assessment::version).collect();
        versions.sort();
        assert_eq!(versions, vec![1, 2, 3]);
        assert!(repo.find_by_org(&OrgId::new("org-2").unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_membership() {
        let dir = InMemoryOrganizationDirectory::new();
        let org = OrgId::new("org-1").unwrap();
        let user = UserId::new("u-1").unwrap();
        dir.onboard(&org, "Clinic", OrganizationProfile::baseline(OrgType::Clinic));
        dir.add_member(&org, &user);

        assert!(dir.is_member(&org, &user).await.unwrap());
        assert!(!dir.is_member(&org, &UserId::new("u-2").unwrap()).await.unwrap());
        assert!(dir.organization(&org).await.unwrap().unwrap().onboarding_completed);
    }
}
