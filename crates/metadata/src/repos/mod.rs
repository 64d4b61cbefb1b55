//! Repository traits for configuration and operational data.
//!
//! Reads go through the shared pool and take `&self`. Anything that writes,
//! plus the uniqueness checks that guard a write, runs inside a caller-owned
//! [`UnitOfWork`](crate::UnitOfWork).

pub mod api_resources;
pub mod api_scopes;
pub mod clients;
pub mod identity_resources;
pub mod persisted_grants;

pub use api_resources::ApiResourceRepo;
pub use api_scopes::ApiScopeRepo;
pub use clients::ClientRepo;
pub use identity_resources::IdentityResourceRepo;
pub use persisted_grants::PersistedGrantRepo;
