//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod assessments;
pub mod audit;
pub mod dto;
pub mod guidance;
pub mod remediation;

pub use assessments::AssessmentService;
pub use audit::AuditRecorder;
pub use dto::*;
pub use guidance::GuidanceService;
pub use remediation::RemediationService;
