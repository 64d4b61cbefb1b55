//! Configuration types shared across crates.

use crate::error::{Error, Result};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metadata store backend.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Administrative service defaults.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Default clone policy.
    #[serde(default)]
    pub clone: CloneConfig,
}

impl AppConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.metadata.validate()?;
        self.admin.validate()?;
        Ok(())
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database file.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// Query timeout in seconds (advisory only - SQLite cannot force-cancel queries).
        #[serde(default = "default_sqlite_query_timeout_secs")]
        query_timeout_secs: Option<u64>,
        /// How long a writer waits on a locked database, in milliseconds.
        #[serde(default = "default_sqlite_busy_timeout_ms")]
        busy_timeout_ms: u64,
    },
}

fn default_sqlite_query_timeout_secs() -> Option<u64> {
    Some(600) // 10 minutes (advisory only)
}

fn default_sqlite_busy_timeout_ms() -> u64 {
    5000
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/gatehouse.db"),
            query_timeout_secs: default_sqlite_query_timeout_secs(),
            busy_timeout_ms: default_sqlite_busy_timeout_ms(),
        }
    }
}

impl MetadataConfig {
    /// Validate metadata configuration invariants.
    pub fn validate(&self) -> Result<()> {
        match self {
            MetadataConfig::Sqlite { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(Error::Config(
                        "sqlite config requires a non-empty 'path'".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Defaults applied by the administrative services.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Actor recorded in audit events when the caller does not name one.
    #[serde(default = "default_actor")]
    pub default_actor: String,
    /// Page size used when a listing request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_actor() -> String {
    "system".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            default_actor: default_actor(),
            default_page_size: default_page_size(),
        }
    }
}

impl AdminConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_actor.trim().is_empty() {
            return Err(Error::Config(
                "admin.default_actor must not be empty".to_string(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "admin.default_page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }
}

/// Defaults for the clone policy.
///
/// Secrets are never copied unless explicitly enabled, and the display name of
/// the source is dropped so the clone is not mistaken for the original.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CloneConfig {
    /// Copy secret collections into the clone (default: false).
    #[serde(default)]
    pub include_secrets: bool,
    /// Keep the source display name instead of resetting it (default: false).
    #[serde(default)]
    pub keep_display_name: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.admin.default_actor, "system");
        assert_eq!(config.admin.default_page_size, DEFAULT_PAGE_SIZE);
        assert!(!config.clone.include_secrets);
        assert!(!config.clone.keep_display_name);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metadata_config_deserialize_sqlite() {
        let config: MetadataConfig =
            serde_json::from_str(r#"{"type":"sqlite","path":"/tmp/gh.db"}"#).unwrap();
        match config {
            MetadataConfig::Sqlite {
                path,
                query_timeout_secs,
                busy_timeout_ms,
            } => {
                assert_eq!(path, PathBuf::from("/tmp/gh.db"));
                assert_eq!(query_timeout_secs, Some(600));
                assert_eq!(busy_timeout_ms, 5000);
            }
        }
    }

    #[test]
    fn test_metadata_config_rejects_empty_path() {
        let config = MetadataConfig::Sqlite {
            path: PathBuf::new(),
            query_timeout_secs: None,
            busy_timeout_ms: 5000,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_admin_config_rejects_bad_page_size() {
        let config = AdminConfig {
            default_actor: "ops".to_string(),
            default_page_size: 0,
        };
        assert!(config.validate().is_err());

        let config = AdminConfig {
            default_actor: "ops".to_string(),
            default_page_size: MAX_PAGE_SIZE + 1,
        };
        assert!(config.validate().is_err());
    }
}
