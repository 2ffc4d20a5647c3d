//! Audit Sinks
//!
//! `HashChainAuditLog` is an append-only, tamper-evident trail: every record
//! carries the SHA-256 of its predecessor. `TracingAuditSink` writes entries
//! to the log instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mizan_common::OrgId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::events::AuditAction;
use crate::ports::outbound::{AuditEntry, AuditError, AuditSink};

const GENESIS: &str = "genesis";

/// Audit trail with hash chain
pub struct HashChainAuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl HashChainAuditLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Append an entry, returning its record ID
    pub fn append(&self, entry: AuditEntry) -> Result<String, AuditError> {
        let mut records = self.records.write();
        let prev_hash = records.last().map(|r| r.hash.clone()).unwrap_or_else(|| GENESIS.into());

        let mut record = AuditRecord {
            id: Uuid::new_v4().to_string(),
            entry,
            prev_hash,
            hash: String::new(),
        };
        record.hash = record.compute_hash()?;

        let id = record.id.clone();
        records.push(record);
        Ok(id)
    }

    /// Get records
    pub fn records(&self, filter: Option<&AuditFilter>) -> Vec<AuditRecord> {
        let records = self.records.read();
        match filter {
            Some(f) => records.iter().filter(|r| f.matches(&r.entry)).cloned().collect(),
            None => records.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Verify chain integrity
    pub fn verify_integrity(&self) -> IntegrityResult {
        let records = self.records.read();
        let mut prev_hash = GENESIS.to_string();
        let mut checked_count = 0;

        for record in records.iter() {
            if record.prev_hash != prev_hash {
                return IntegrityResult::broken(checked_count, format!("hash chain broken at record {}", record.id));
            }
            match record.compute_hash() {
                Ok(computed) if computed == record.hash => {}
                _ => {
                    return IntegrityResult::broken(checked_count, format!("record {} hash mismatch", record.id));
                }
            }
            prev_hash = record.hash.clone();
            checked_count += 1;
        }

        IntegrityResult {
            valid: true,
            checked_count,
            error: None,
        }
    }

    /// Export to format
    pub fn export(&self, format: ExportFormat) -> Result<String, AuditError> {
        let records = self.records.read();
        match format {
            ExportFormat::Json => {
                serde_json::to_string_pretty(&*records).map_err(|e| AuditError(e.to_string()))
            }
            ExportFormat::Csv => Ok(to_csv(&records)),
        }
    }

    #[cfg(test)]
    fn tamper(&self, index: usize, f: impl FnOnce(&mut AuditRecord)) {
        if let Some(record) = self.records.write().get_mut(index) {
            f(record);
        }
    }
}

impl Default for HashChainAuditLog {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl AuditSink for HashChainAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.append(entry).map(|_| ())
    }
}

fn to_csv(records: &[AuditRecord]) -> String {
    let mut csv = "timestamp,org_id,user_id,action,entity_type,entity_id,ip_address,hash\n".to_string();
    for r in records {
        let e = &r.entry;
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            e.timestamp.to_rfc3339(),
            e.org_id,
            e.user_id,
            e.action,
            e.entity_type.map(|t| t.as_str()).unwrap_or(""),
            e.entity_id.as_deref().unwrap_or(""),
            e.ip_address,
            r.hash,
        ));
    }
    csv
}

/// Stored audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub prev_hash: String,
    pub hash: String,
}

impl AuditRecord {
    fn compute_hash(&self) -> Result<String, AuditError> {
        let body = serde_json::to_string(&self.entry).map_err(|e| AuditError(e.to_string()))?;
        let data = format!("{}|{}|{}", self.id, body, self.prev_hash);
        Ok(hex::encode(Sha256::digest(data.as_bytes())))
    }
}

/// Audit filter
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub org_id: Option<OrgId>,
    pub action: Option<AuditAction>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl AuditFilter {
    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(org) = &self.org_id {
            if &entry.org_id != org {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(s) = &self.start_time {
            if entry.timestamp < *s {
                return false;
            }
        }
        if let Some(e) = &self.end_time {
            if entry.timestamp > *e {
                return false;
            }
        }
        true
    }
}

/// Integrity check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityResult {
    pub valid: bool,
    pub checked_count: usize,
    pub error: Option<String>,
}

impl IntegrityResult {
    fn broken(checked_count: usize, error: String) -> Self {
        Self {
            valid: false,
            checked_count,
            error: Some(error),
        }
    }
}

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Writes audit entries to the tracing log
#[derive(Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        tracing::info!(
            target: "mizan::audit",
            org_id = %entry.org_id,
            user_id = %entry.user_id,
            action = %entry.action,
            entity_id = entry.entity_id.as_deref().unwrap_or(""),
            ip = %entry.ip_address,
            "audit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EntityType;
    use mizan_common::{Actor, Role, UserId};
    use std::sync::Arc;

    fn entry(org: &str, action: AuditAction) -> AuditEntry {
        let org = OrgId::new(org).unwrap();
        let actor = Actor::new(UserId::new("u-1").unwrap(), org.clone(), Role::Dpo);
        AuditEntry::new(&actor, org, action, Utc::now()).entity(EntityType::Assessment, "a-1")
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn test_tracing_sink_logs_entry() {
        let captured = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        TracingAuditSink.record(entry("org-7", AuditAction::TaskEscalated)).await.unwrap();

        let out = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(out.contains("mizan::audit"));
        assert!(out.contains("org_id=org-7"));
        assert!(out.contains("action=TASK_ESCALATED"));
    }

    #[test]
    fn test_chain_verifies() {
        let log = HashChainAuditLog::new();
        log.append(entry("org-1", AuditAction::AssessmentCreated)).unwrap();
        log.append(entry("org-1", AuditAction::ResponseSubmitted)).unwrap();
        log.append(entry("org-2", AuditAction::AssessmentCreated)).unwrap();

        let result = log.verify_integrity();
        assert!(result.valid);
        assert_eq!(result.checked_count, 3);
        assert_eq!(log.records(None)[0].prev_hash, GENESIS);
    }

    #[test]
    fn test_tampering_is_detected() {
        let log = HashChainAuditLog::new();
        log.append(entry("org-1", AuditAction::AssessmentCreated)).unwrap();
        log.append(entry("org-1", AuditAction::AssessmentFinalized)).unwrap();
        log.tamper(0, |r| r.entry.ip_address = "203.0.113.9".into());

        let result = log.verify_integrity();
        assert!(!result.valid);
        assert_eq!(result.checked_count, 0);
    }

    #[test]
    fn test_filter_by_org_and_action() {
        let log = HashChainAuditLog::new();
        log.append(entry("org-1", AuditAction::AssessmentCreated)).unwrap();
        log.append(entry("org-1", AuditAction::ResponseSubmitted)).unwrap();
        log.append(entry("org-2", AuditAction::ResponseSubmitted)).unwrap();

        let filter = AuditFilter {
            org_id: Some(OrgId::new("org-1").unwrap()),
            action: Some(AuditAction::ResponseSubmitted),
            ..Default::default()
        };
        assert_eq!(log.records(Some(&filter)).len(), 1);
    }

    #[test]
    fn test_export() {
        let log = HashChainAuditLog::new();
        log.append(entry("org-1", AuditAction::TaskAssigned)).unwrap();

        let csv = log.export(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("timestamp,org_id"));
        assert!(csv.contains("TASK_ASSIGNED"));

        let json = log.export(ExportFormat::Json).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["action"], "TASK_ASSIGNED");
        assert_eq!(parsed[0]["entity_type"], "assessment");
    }
}
