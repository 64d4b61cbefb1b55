//! Administrative services for Gatehouse configuration data.
//!
//! This crate sits between callers (the `gatehousectl` binary, an admin UI,
//! tests) and the metadata store:
//! - DTOs and the pure mappers between DTOs and stored entities
//! - One service per aggregate, each mutation running in its own unit of work
//! - The clone engine and its per-aggregate policies
//! - Audit events emitted after every committed mutation
//! - Resource-coded errors for the caller's localization layer

pub mod audit;
pub mod clone;
pub mod context;
pub mod dtos;
pub mod error;
pub mod mappers;
pub mod services;

pub use audit::{AuditEvent, AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use clone::{ClonePolicy, Cloneable, DisplayNameRule};
pub use context::AdminContext;
pub use error::{AdminError, AdminResult, ResourceCode};
pub use services::{
    ApiResourceService, ApiScopeService, ClientService, IdentityResourceService,
    PersistedGrantService,
};
