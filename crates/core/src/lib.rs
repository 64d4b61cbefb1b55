//! Core domain types shared across the Gatehouse crates.
//!
//! This crate defines the pieces every other crate builds on:
//! - Application configuration (metadata store, admin defaults, clone policy)
//! - The paged query primitive and search pattern handling
//! - Surrogate/business key identity for aggregates

pub mod aggregate;
pub mod config;
pub mod error;
pub mod paging;

pub use aggregate::{Aggregate, SurrogateKey, UNASSIGNED};
pub use error::{Error, Result};
pub use paging::{Page, PagedList, SortOrder};

/// Default page size for paged queries.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a caller may request; larger sizes are clamped.
pub const MAX_PAGE_SIZE: u32 = 1000;
