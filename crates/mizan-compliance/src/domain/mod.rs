//! Domain Layer
//!
//! Pure business logic: catalog, branching rules, scoring and the two
//! aggregates. No I/O.

pub mod aggregates;
pub mod branching;
pub mod catalog;
pub mod events;
pub mod profile;
pub mod scoring;
pub mod value_objects;

pub use aggregates::*;
pub use branching::{ApplicabilityCondition, BranchingEngine, BranchingResult};
pub use catalog::{Control, ControlCatalog, ControlSource, RiskLevel};
pub use events::{AuditAction, DomainEvent, EntityType};
pub use profile::{CloudUsage, OrgType, OrganizationProfile};
pub use scoring::{DomainScore, GapCounts, ScoreSummary, ScoringInput, ScoringService};
pub use value_objects::{Answer, DeadlinePolicy, GapType, Language};
