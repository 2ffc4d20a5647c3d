//! Evidence Registry
//!
//! Tracks evidence files linked to remediation tasks. Storage of the bytes
//! themselves lives elsewhere; only the content hash is kept here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mizan_common::{EvidenceId, TaskId, UserId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::outbound::{EvidenceLocator, RepositoryError};

/// Evidence file metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFile {
    pub id: EvidenceId,
    pub task_id: TaskId,
    pub file_name: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EvidenceFile {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// In-memory evidence registry
#[derive(Default)]
pub struct InMemoryEvidenceRegistry {
    files: RwLock<Vec<EvidenceFile>>,
}

impl InMemoryEvidenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a file to a task
    pub fn attach(&self, task_id: &TaskId, file_name: &str, content: &[u8], uploaded_by: &UserId) -> EvidenceFile {
        let file = EvidenceFile {
            id: EvidenceId::generate(),
            task_id: task_id.clone(),
            file_name: file_name.to_string(),
            sha256: hex::encode(Sha256::digest(content)),
            size_bytes: content.len() as u64,
            uploaded_by: uploaded_by.clone(),
            uploaded_at: Utc::now(),
            deleted_at: None,
        };
        self.files.write().push(file.clone());
        tracing::debug!(task_id = %task_id, evidence_id = %file.id, "evidence attached");
        file
    }

    /// Soft delete; returns false when the file is unknown or already deleted
    pub fn delete(&self, id: &EvidenceId) -> bool {
        let mut files = self.files.write();
        match files.iter_mut().find(|f| &f.id == id && !f.is_deleted()) {
            Some(file) => {
                file.deleted_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Live files of a task
    pub fn for_task(&self, task_id: &TaskId) -> Vec<EvidenceFile> {
        self.files.read()
            .iter()
            .filter(|f| &f.task_id == task_id && !f.is_deleted())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EvidenceLocator for InMemoryEvidenceRegistry {
    async fn has_evidence(&self, task_id: &TaskId) -> Result<bool, RepositoryError> {
        Ok(self.files.read().iter().any(|f| &f.task_id == task_id && !f.is_deleted()))
    }
}
