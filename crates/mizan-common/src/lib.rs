//! Mizan Common - Shared types for the compliance assessment platform
//!
//! This crate provides the primitives every bounded context agrees on:
//! - Typed identifiers (organizations, users, assessments, tasks, controls)
//! - The closed role vocabulary and its capabilities
//! - The acting principal of an operation ([`Actor`])
//! - Stable, machine-readable error codes
//! - Tracing initialisation for binaries
//!
//! # Design
//!
//! ## Domain-Driven Design
//! - **Value Objects**: Immutable, validated primitives (ControlId, OrgId)
//! - **Capabilities**: Role checks resolved once per operation, never by
//!   comparing role names at call sites
//!
//! ## Multi-tenancy
//! Every identifier that crosses a tenant boundary is typed, so an
//! `OrgId` can never be passed where a `UserId` is expected.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod error;
pub mod telemetry;

pub use domain::*;
pub use error::*;
