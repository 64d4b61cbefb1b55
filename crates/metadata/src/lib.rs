//! Metadata store abstraction and the SQLite implementation for Gatehouse.
//!
//! This crate provides the configuration-store data model:
//! - Clients with their secrets, claims, properties and uri/scope lists
//! - API resources, API scopes and identity resources
//! - Persisted grants written by the token service
//! - The unit of work that scopes every mutation

pub mod error;
pub mod models;
pub mod repos;
pub mod store;
pub mod unit_of_work;

pub use error::{MetadataError, MetadataResult};
pub use store::{MetadataStore, SqliteStore};
pub use unit_of_work::UnitOfWork;

use gatehouse_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    config
        .validate()
        .map_err(|e| MetadataError::Config(e.to_string()))?;

    match config {
        MetadataConfig::Sqlite {
            path,
            query_timeout_secs,
            busy_timeout_ms,
        } => {
            let store = SqliteStore::new(path, *query_timeout_secs, *busy_timeout_ms).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_from_config_sqlite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("metadata.db");
        let config = MetadataConfig::Sqlite {
            path: db_path.clone(),
            query_timeout_secs: None,
            busy_timeout_ms: 5000,
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_from_config_rejects_empty_path() {
        let config = MetadataConfig::Sqlite {
            path: PathBuf::new(),
            query_timeout_secs: None,
            busy_timeout_ms: 5000,
        };

        match from_config(&config).await {
            Err(MetadataError::Config(msg)) => assert!(msg.contains("path")),
            Err(other) => panic!("expected config error, got {other}"),
            Ok(_) => panic!("expected config error"),
        }
    }
}
