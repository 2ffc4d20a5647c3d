//! Audit recording
//!
//! Turns the domain events of one operation into audit entries. Sink
//! failures are logged and dropped: the primary write has already happened
//! and must stand.

use chrono::{DateTime, Utc};
use mizan_common::Actor;
use std::sync::Arc;

use crate::domain::events::DomainEvent;
use crate::ports::outbound::{AuditEntry, AuditSink};

/// Best-effort audit writer shared by the application services
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn entry_for(actor: &Actor, event: &DomainEvent, now: DateTime<Utc>) -> AuditEntry {
        let (entity_type, entity_id) = event.entity();
        let (old_value, new_value) = event.change_values();
        AuditEntry::new(actor, event.org_id().clone(), event.action(), now)
            .entity(entity_type, entity_id)
            .values(old_value, new_value)
    }

    /// Record every event; never fails
    pub async fn record_events(&self, actor: &Actor, events: Vec<DomainEvent>, now: DateTime<Utc>) {
        for event in events {
            let entry = Self::entry_for(actor, &event, now);
            let action = entry.action;
            if let Err(e) = self.sink.record(entry).await {
                tracing::warn!(%action, org_id = %actor.org_id, error = %e, "audit write failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Assessment;
    use crate::domain::events::AuditAction;
    use crate::infrastructure::HashChainAuditLog;
    use crate::ports::outbound::AuditError;
    use async_trait::async_trait;
    use mizan_common::{OrgId, Role, UserId};

    struct BrokenSink;

    #[async_trait]
    impl AuditSink for BrokenSink {
        async fn record(&self, _entry: AuditEntry) -> Result<(), AuditError> {
            Err(AuditError("disk full".into()))
        }
    }

    fn actor() -> Actor {
        Actor::new(UserId::new("u-1").unwrap(), OrgId::new("org-1").unwrap(), Role::Dpo)
            .with_client("10.1.2.3", Some("browser".into()))
    }

    #[tokio::test]
    async fn test_events_become_entries() {
        let log = Arc::new(HashChainAuditLog::new());
        let recorder = AuditRecorder::new(log.clone());
        let mut assessment = Assessment::create(OrgId::new("org-1").unwrap(), 1, UserId::new("u-1").unwrap(), Utc::now());

        recorder.record_events(&actor(), assessment.take_events(), Utc::now()).await;

        let records = log.records(None);
        assert_eq!(records.len(), 1);
        let entry = &records[0].entry;
        assert_eq!(entry.action, AuditAction::AssessmentCreated);
        assert_eq!(entry.entity_id.as_deref(), Some(assessment.id().as_str()));
        assert_eq!(entry.ip_address, "10.1.2.3");
        assert_eq!(entry.new_value.as_ref().unwrap()["version"], 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let recorder = AuditRecorder::new(Arc::new(BrokenSink));
        let mut assessment = Assessment::create(OrgId::new("org-1").unwrap(), 1, UserId::new("u-1").unwrap(), Utc::now());
        recorder.record_events(&actor(), assessment.take_events(), Utc::now()).await;
    }
}
