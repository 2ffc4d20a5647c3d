//! Mizan Compliance Engine
//!
//! Multi-tenant compliance assessment core for Saudi regulatory frameworks
//! (PDPL, NCA ECC and the MOH health-sector addendum).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Application Services                     │
//! │   AssessmentService   RemediationService   GuidanceService   │
//! └──────────────┬──────────────────────────────┬────────────────┘
//!                │ inbound ports                │ outbound ports
//! ┌──────────────▼───────────────┐   ┌──────────▼────────────────┐
//! │            Domain            │   │      Infrastructure       │
//! │  catalog · branching rules   │   │  in-memory repositories   │
//! │  scoring · Assessment        │   │  hash-chained audit log   │
//! │  RemediationTask             │   │  evidence registry, locks │
//! └──────────────────────────────┘   └───────────────────────────┘
//! ```
//!
//! - **Domain Layer**: control catalog, branching engine, scoring, the
//!   assessment and remediation task aggregates and their events
//! - **Application Layer**: use case orchestration, DTOs, audit recording
//! - **Ports Layer**: hexagonal interfaces
//! - **Infrastructure Layer**: in-memory adapters
//!
//! ## Consistency
//!
//! Mutations of one aggregate are serialized through [`AggregateLocks`].
//! Audit writes happen after the primary write and never fail it.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// Re-exports for convenience
pub use application::{AssessmentService, GuidanceService, RemediationService};
pub use config::{ComplianceConfig, ConfigError, GuidanceConfig};
pub use domain::aggregates::{Assessment, AssessmentStatus, RemediationTask, TaskStatus};
pub use domain::branching::{BranchingEngine, BranchingResult};
pub use domain::catalog::{Control, ControlCatalog, RiskLevel};
pub use domain::events::{AuditAction, DomainEvent};
pub use domain::profile::{CloudUsage, OrgType, OrganizationProfile};
pub use domain::scoring::{ScoreSummary, ScoringInput, ScoringService};
pub use domain::value_objects::{Answer, GapType, Language};
pub use infrastructure::AggregateLocks;
pub use ports::inbound::{AssessmentUseCases, GuidanceUseCases, RemediationUseCases, UseCaseError};
pub use ports::outbound::{AuditSink, EvidenceLocator, OrganizationDirectory, RepositoryError, TextGenerator};
