//! Metadata store error types.

use thiserror::Error;

/// Metadata store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MetadataError {
    /// Map a storage-level UNIQUE violation to `AlreadyExists`, keeping every
    /// other database error as-is.
    pub(crate) fn from_insert(err: sqlx::Error, what: impl FnOnce() -> String) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                MetadataError::AlreadyExists(what())
            }
            other => MetadataError::Database(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MetadataError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, MetadataError::AlreadyExists(_))
    }
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_insert_passes_through_other_errors() {
        let err = MetadataError::from_insert(sqlx::Error::RowNotFound, || "client 'web'".into());
        assert!(matches!(err, MetadataError::Database(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn test_predicates() {
        assert!(MetadataError::NotFound("client 7".into()).is_not_found());
        assert!(MetadataError::AlreadyExists("client 'web'".into()).is_already_exists());
        assert!(!MetadataError::Internal("boom".into()).is_not_found());
    }
}
