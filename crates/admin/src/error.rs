//! Service error types and resource codes.

use gatehouse_metadata::{MetadataError, MetadataResult};
use serde::Serialize;

/// Message keys handed to the caller's localization layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceCode {
    ClientDoesNotExist,
    ClientExistsValue,
    ClientSecretDoesNotExist,
    ClientClaimDoesNotExist,
    ClientPropertyDoesNotExist,
    ClientPropertyExistsValue,
    ClientValueDoesNotExist,
    ApiResourceDoesNotExist,
    ApiResourceExistsValue,
    ApiResourceSecretDoesNotExist,
    ApiResourcePropertyDoesNotExist,
    ApiResourcePropertyExistsValue,
    ApiScopeDoesNotExist,
    ApiScopeExistsValue,
    ApiScopePropertyDoesNotExist,
    ApiScopePropertyExistsValue,
    IdentityResourceDoesNotExist,
    IdentityResourceExistsValue,
    IdentityResourcePropertyDoesNotExist,
    IdentityResourcePropertyExistsValue,
    PersistedGrantDoesNotExist,
    PersistedGrantExistsValue,
}

impl ResourceCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientDoesNotExist => "ClientDoesNotExist",
            Self::ClientExistsValue => "ClientExistsValue",
            Self::ClientSecretDoesNotExist => "ClientSecretDoesNotExist",
            Self::ClientClaimDoesNotExist => "ClientClaimDoesNotExist",
            Self::ClientPropertyDoesNotExist => "ClientPropertyDoesNotExist",
            Self::ClientPropertyExistsValue => "ClientPropertyExistsValue",
            Self::ClientValueDoesNotExist => "ClientValueDoesNotExist",
            Self::ApiResourceDoesNotExist => "ApiResourceDoesNotExist",
            Self::ApiResourceExistsValue => "ApiResourceExistsValue",
            Self::ApiResourceSecretDoesNotExist => "ApiResourceSecretDoesNotExist",
            Self::ApiResourcePropertyDoesNotExist => "ApiResourcePropertyDoesNotExist",
            Self::ApiResourcePropertyExistsValue => "ApiResourcePropertyExistsValue",
            Self::ApiScopeDoesNotExist => "ApiScopeDoesNotExist",
            Self::ApiScopeExistsValue => "ApiScopeExistsValue",
            Self::ApiScopePropertyDoesNotExist => "ApiScopePropertyDoesNotExist",
            Self::ApiScopePropertyExistsValue => "ApiScopePropertyExistsValue",
            Self::IdentityResourceDoesNotExist => "IdentityResourceDoesNotExist",
            Self::IdentityResourceExistsValue => "IdentityResourceExistsValue",
            Self::IdentityResourcePropertyDoesNotExist => "IdentityResourcePropertyDoesNotExist",
            Self::IdentityResourcePropertyExistsValue => "IdentityResourcePropertyExistsValue",
            Self::PersistedGrantDoesNotExist => "PersistedGrantDoesNotExist",
            Self::PersistedGrantExistsValue => "PersistedGrantExistsValue",
        }
    }
}

impl std::fmt::Display for ResourceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable error report, as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Service error type.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{code}: {detail}")]
    NotFound { code: ResourceCode, detail: String },

    #[error("{code}: {detail}")]
    Conflict { code: ResourceCode, detail: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

impl AdminError {
    pub fn not_found(code: ResourceCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn conflict(code: ResourceCode, detail: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            detail: detail.into(),
        }
    }

    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { code, .. } | Self::Conflict { code, .. } => code.as_str(),
            Self::Validation(_) => "validation_failed",
            Self::Metadata(_) => "storage_failure",
        }
    }

    /// Resource code for `NotFound` and `Conflict` errors.
    pub fn resource_code(&self) -> Option<ResourceCode> {
        match self {
            Self::NotFound { code, .. } | Self::Conflict { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<gatehouse_core::Error> for AdminError {
    fn from(err: gatehouse_core::Error) -> Self {
        match err {
            gatehouse_core::Error::InvalidKey(msg) | gatehouse_core::Error::Config(msg) => {
                Self::Validation(msg)
            }
        }
    }
}

/// Result type for service operations.
pub type AdminResult<T> = std::result::Result<T, AdminError>;

/// Attach resource codes to repository results.
///
/// Only `NotFound` and `AlreadyExists` are translated; every other storage
/// error passes through unchanged.
pub(crate) trait Coded<T> {
    fn coded(self, not_found: ResourceCode, conflict: ResourceCode) -> AdminResult<T>;

    /// Like [`coded`](Coded::coded) for operations that cannot conflict.
    fn missing(self, not_found: ResourceCode) -> AdminResult<T>;
}

impl<T> Coded<T> for MetadataResult<T> {
    fn coded(self, not_found: ResourceCode, conflict: ResourceCode) -> AdminResult<T> {
        self.map_err(|err| match err {
            MetadataError::NotFound(detail) => AdminError::not_found(not_found, detail),
            MetadataError::AlreadyExists(detail) => AdminError::conflict(conflict, detail),
            other => AdminError::Metadata(other),
        })
    }

    fn missing(self, not_found: ResourceCode) -> AdminResult<T> {
        self.map_err(|err| match err {
            MetadataError::NotFound(detail) => AdminError::not_found(not_found, detail),
            other => AdminError::Metadata(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coded_translates_only_not_found_and_conflict() {
        let missing: MetadataResult<()> = Err(MetadataError::NotFound("client 7".into()));
        let err = missing
            .coded(ResourceCode::ClientDoesNotExist, ResourceCode::ClientExistsValue)
            .unwrap_err();
        assert_eq!(err.resource_code(), Some(ResourceCode::ClientDoesNotExist));
        assert_eq!(err.code(), "ClientDoesNotExist");

        let taken: MetadataResult<()> = Err(MetadataError::AlreadyExists("client 'web'".into()));
        let err = taken
            .coded(ResourceCode::ClientDoesNotExist, ResourceCode::ClientExistsValue)
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "ClientExistsValue: client 'web'");

        let broken: MetadataResult<()> = Err(MetadataError::Internal("disk".into()));
        let err = broken
            .coded(ResourceCode::ClientDoesNotExist, ResourceCode::ClientExistsValue)
            .unwrap_err();
        assert!(matches!(err, AdminError::Metadata(MetadataError::Internal(_))));
        assert_eq!(err.code(), "storage_failure");
    }

    #[test]
    fn test_missing_leaves_conflicts_uncoded() {
        let taken: MetadataResult<()> = Err(MetadataError::AlreadyExists("secret".into()));
        let err = taken.missing(ResourceCode::ClientSecretDoesNotExist).unwrap_err();
        assert!(matches!(err, AdminError::Metadata(MetadataError::AlreadyExists(_))));
    }

    #[test]
    fn test_invalid_key_becomes_validation() {
        let err: AdminError = gatehouse_core::Error::InvalidKey("name must not be empty".into()).into();
        assert_eq!(err.code(), "validation_failed");
        assert_eq!(err.report().message, "validation failed: name must not be empty");
    }
}
