//! Outbound ports
//!
//! Interfaces the infrastructure layer implements: storage, the
//! organization directory, evidence lookup, the audit sink and the external
//! text generator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mizan_common::{Actor, AssessmentId, ControlId, OrgId, TaskId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Assessment, RemediationTask};
use crate::domain::catalog::RiskLevel;
use crate::domain::events::{AuditAction, EntityType};
use crate::domain::profile::OrganizationProfile;
use crate::domain::value_objects::{GapType, Language};

/// Assessment repository port
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Find assessment by ID
    async fn find_by_id(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError>;

    /// All assessments of an organization, any status
    async fn find_by_org(&self, org_id: &OrgId) -> Result<Vec<Assessment>, RepositoryError>;

    /// Save assessment (insert or update)
    async fn save(&self, assessment: &Assessment) -> Result<(), RepositoryError>;
}

/// Remediation task repository port
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<RemediationTask>, RepositoryError>;

    /// The task raised for one (assessment, control) pair, if any
    async fn find_for_response(
        &self,
        assessment_id: &AssessmentId,
        control_id: &ControlId,
    ) -> Result<Option<RemediationTask>, RepositoryError>;

    async fn find_by_org(&self, org_id: &OrgId) -> Result<Vec<RemediationTask>, RepositoryError>;

    async fn save(&self, task: &RemediationTask) -> Result<(), RepositoryError>;
}

/// Organization data owned outside this crate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub org_id: OrgId,
    pub name: String,
    pub profile: Option<OrganizationProfile>,
    pub onboarding_completed: bool,
}

/// Read-only view of organizations and their members
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn organization(&self, org_id: &OrgId) -> Result<Option<OrganizationRecord>, RepositoryError>;

    async fn is_member(&self, org_id: &OrgId, user_id: &UserId) -> Result<bool, RepositoryError>;
}

/// Evidence existence check
#[async_trait]
pub trait EvidenceLocator: Send + Sync {
    /// At least one non-deleted evidence file is linked to the task
    async fn has_evidence(&self, task_id: &TaskId) -> Result<bool, RepositoryError>;
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub org_id: OrgId,
    pub user_id: UserId,
    pub action: AuditAction,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<String>,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub ip_address: String,
    pub user_agent: Option<String>,
}

impl AuditEntry {
    pub fn new(actor: &Actor, org_id: OrgId, action: AuditAction, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            org_id,
            user_id: actor.user_id.clone(),
            action,
            entity_type: None,
            entity_id: None,
            old_value: None,
            new_value: None,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
        }
    }

    pub fn entity(mut self, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type);
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn values(
        mut self,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
    ) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }
}

/// Append-only audit writer, best effort
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Structured input for remediation guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceContext {
    pub task_id: TaskId,
    pub control_id: ControlId,
    pub control_title: String,
    pub risk_level: RiskLevel,
    pub gap_type: GapType,
    pub legal_basis: String,
    pub evidence_guidance: String,
    pub language: Language,
}

/// External text-generation service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, context: &GuidanceContext) -> Result<String, GenerationError>;
}

/// Repository error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Audit write failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("audit write failed: {0}")]
pub struct AuditError(pub String);

/// Text generation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("text generation unavailable: {0}")]
    Unavailable(String),
    #[error("text generation timed out after {0}s")]
    Timeout(u64),
}
