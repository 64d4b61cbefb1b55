//! Administrative services, one per aggregate type.
//!
//! Every mutation follows the same shape: validate the input, load whatever
//! the operation needs through the pool, open a unit of work, write, commit,
//! then emit exactly one audit event. Reads never happen while a unit of work
//! is open.

pub mod api_resources;
pub mod api_scopes;
pub mod clients;
pub mod identity_resources;
pub mod persisted_grants;

pub use api_resources::ApiResourceService;
pub use api_scopes::ApiScopeService;
pub use clients::ClientService;
pub use identity_resources::IdentityResourceService;
pub use persisted_grants::PersistedGrantService;

use crate::dtos::PropertyDto;
use crate::error::{AdminError, AdminResult, ResourceCode};
use std::collections::HashSet;

/// Property keys are unique per parent; report a repeated key under the
/// property code instead of letting the store reject the whole aggregate.
pub(crate) fn ensure_unique_property_keys(
    properties: &[PropertyDto],
    code: ResourceCode,
) -> AdminResult<()> {
    let mut seen = HashSet::new();
    match properties.iter().find(|p| !seen.insert(p.key.as_str())) {
        Some(repeated) => Err(AdminError::conflict(
            code,
            format!("property '{}'", repeated.key),
        )),
        None => Ok(()),
    }
}
