//! Aggregate identity.
//!
//! Every stored row carries a storage-assigned surrogate key. Root rows also
//! carry a caller-supplied business key that is unique across the store; its
//! type is chosen per aggregate.

use crate::error::{Error, Result};
use std::fmt::Display;
use std::hash::Hash;

/// Storage-assigned row identifier.
pub type SurrogateKey = i64;

/// Surrogate key value of a row that has not been persisted yet.
pub const UNASSIGNED: SurrogateKey = 0;

/// Returns true when `id` was assigned by storage.
pub fn is_assigned(id: SurrogateKey) -> bool {
    id > UNASSIGNED
}

/// A root entity that owns its child rows.
pub trait Aggregate {
    /// Caller-meaningful unique key (client identifier, resource name, ...).
    type BusinessKey: Eq + Hash + Clone + Display + Send + Sync;

    /// Human-readable aggregate type, used in logs and error details.
    const KIND: &'static str;

    /// Surrogate key of the root row.
    fn id(&self) -> SurrogateKey;

    /// Business key of the root row.
    fn business_key(&self) -> &Self::BusinessKey;

    /// Whether the root row has been persisted.
    fn is_persisted(&self) -> bool {
        is_assigned(self.id())
    }
}

/// Reject empty or whitespace-only keys.
pub fn validate_key(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidKey(format!("{field} must not be empty")));
    }
    Ok(())
}
