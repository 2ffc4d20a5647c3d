//! Infrastructure Layer
//!
//! In-memory adapters for the outbound ports plus the lock registry.

pub mod audit;
pub mod evidence;
pub mod locks;
pub mod persistence;

pub use audit::{AuditFilter, AuditRecord, ExportFormat, HashChainAuditLog, IntegrityResult, TracingAuditSink};
pub use evidence::{EvidenceFile, InMemoryEvidenceRegistry};
pub use locks::{AggregateGuard, AggregateLocks};
pub use persistence::{InMemoryAssessmentRepository, InMemoryOrganizationDirectory, InMemoryTaskRepository};
