//! Shared domain model
//!
//! - **Value Objects**: identifiers for every aggregate in the platform
//! - **Actor**: the authenticated principal performing an operation

pub mod actor;
pub mod value_objects;

pub use actor::*;
pub use value_objects::*;
