//! Aggregates

pub mod assessment;
pub mod task;

pub use assessment::{
    Assessment, AssessmentError, AssessmentStatus, Response, ResponseChange, ResponseSubmission,
};
pub use task::{RemediationTask, TaskError, TaskStatus, TransitionRequest};
