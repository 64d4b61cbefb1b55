//! Metadata store trait and the SQLite implementation.

use crate::error::MetadataResult;
use crate::repos::{
    ApiResourceRepo, ApiScopeRepo, ClientRepo, IdentityResourceRepo, PersistedGrantRepo,
};
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

mod clients;
mod grants;
mod resources;
mod rows;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    ClientRepo + ApiResourceRepo + ApiScopeRepo + IdentityResourceRepo + PersistedGrantRepo + Send + Sync
{
    /// Create tables and indexes if they do not exist yet.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;

    /// Open a unit of work. Mutations made through it are invisible to other
    /// callers until it is committed.
    async fn begin(&self) -> MetadataResult<UnitOfWork>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout_secs: u64,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
        busy_timeout_ms: u64,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(600);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(busy_timeout_ms));

        // One connection: a unit of work owns it for its whole lifetime, so
        // nothing may read through the pool while a unit is open.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(query_timeout_secs))
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout_secs,
        };
        store.migrate().await?;

        tracing::info!(
            path = %path.display(),
            query_timeout_secs = store.query_timeout_secs,
            "sqlite metadata store ready"
        );

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub(crate) async fn conn(&self) -> MetadataResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> MetadataResult<UnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork::new(tx))
    }
}

const SCHEMA_SQL: &str = r#"
-- Clients
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id TEXT NOT NULL UNIQUE,
    client_name TEXT,
    description TEXT,
    client_uri TEXT,
    logo_uri TEXT,
    protocol_type TEXT NOT NULL DEFAULT 'oidc',
    enabled INTEGER NOT NULL DEFAULT 1,
    require_client_secret INTEGER NOT NULL DEFAULT 1,
    require_consent INTEGER NOT NULL DEFAULT 0,
    require_pkce INTEGER NOT NULL DEFAULT 1,
    allow_offline_access INTEGER NOT NULL DEFAULT 0,
    access_token_lifetime INTEGER NOT NULL DEFAULT 3600,
    identity_token_lifetime INTEGER NOT NULL DEFAULT 300,
    absolute_refresh_token_lifetime INTEGER NOT NULL DEFAULT 2592000,
    non_editable INTEGER NOT NULL DEFAULT 0,
    created TEXT NOT NULL,
    updated TEXT
);

CREATE TABLE IF NOT EXISTS client_secrets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    secret_type TEXT NOT NULL,
    value TEXT NOT NULL,
    description TEXT,
    expiration TEXT,
    created TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_secrets_parent ON client_secrets(parent_id);

CREATE TABLE IF NOT EXISTS client_claims (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    claim_type TEXT NOT NULL,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_claims_parent ON client_claims(parent_id);

CREATE TABLE IF NOT EXISTS client_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    UNIQUE (parent_id, key)
);

CREATE TABLE IF NOT EXISTS client_redirect_uris (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_redirect_uris_parent ON client_redirect_uris(parent_id);

CREATE TABLE IF NOT EXISTS client_post_logout_redirect_uris (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_post_logout_parent ON client_post_logout_redirect_uris(parent_id);

CREATE TABLE IF NOT EXISTS client_scopes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_scopes_parent ON client_scopes(parent_id);

CREATE TABLE IF NOT EXISTS client_grant_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_grant_types_parent ON client_grant_types(parent_id);

CREATE TABLE IF NOT EXISTS client_cors_origins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_cors_origins_parent ON client_cors_origins(parent_id);

CREATE TABLE IF NOT EXISTS client_idp_restrictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_client_idp_restrictions_parent ON client_idp_restrictions(parent_id);

-- API resources
CREATE TABLE IF NOT EXISTS api_resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    display_name TEXT,
    description TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    show_in_discovery_document INTEGER NOT NULL DEFAULT 1,
    require_resource_indicator INTEGER NOT NULL DEFAULT 0,
    non_editable INTEGER NOT NULL DEFAULT 0,
    created TEXT NOT NULL,
    updated TEXT
);

CREATE TABLE IF NOT EXISTS api_resource_secrets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES api_resources(id) ON DELETE CASCADE,
    secret_type TEXT NOT NULL,
    value TEXT NOT NULL,
    description TEXT,
    expiration TEXT,
    created TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_api_resource_secrets_parent ON api_resource_secrets(parent_id);

CREATE TABLE IF NOT EXISTS api_resource_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES api_resources(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    UNIQUE (parent_id, key)
);

CREATE TABLE IF NOT EXISTS api_resource_claims (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES api_resources(id) ON DELETE CASCADE,
    claim_type TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_api_resource_claims_parent ON api_resource_claims(parent_id);

CREATE TABLE IF NOT EXISTS api_resource_scopes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES api_resources(id) ON DELETE CASCADE,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_api_resource_scopes_parent ON api_resource_scopes(parent_id);

-- API scopes
CREATE TABLE IF NOT EXISTS api_scopes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    display_name TEXT,
    description TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    required INTEGER NOT NULL DEFAULT 0,
    emphasize INTEGER NOT NULL DEFAULT 0,
    show_in_discovery_document INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS api_scope_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES api_scopes(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    UNIQUE (parent_id, key)
);

CREATE TABLE IF NOT EXISTS api_scope_claims (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES api_scopes(id) ON DELETE CASCADE,
    claim_type TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_api_scope_claims_parent ON api_scope_claims(parent_id);

-- Identity resources
CREATE TABLE IF NOT EXISTS identity_resources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    display_name TEXT,
    description TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    required INTEGER NOT NULL DEFAULT 0,
    emphasize INTEGER NOT NULL DEFAULT 0,
    show_in_discovery_document INTEGER NOT NULL DEFAULT 1,
    non_editable INTEGER NOT NULL DEFAULT 0,
    created TEXT NOT NULL,
    updated TEXT
);

CREATE TABLE IF NOT EXISTS identity_resource_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES identity_resources(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    UNIQUE (parent_id, key)
);

CREATE TABLE IF NOT EXISTS identity_resource_claims (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES identity_resources(id) ON DELETE CASCADE,
    claim_type TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_identity_resource_claims_parent ON identity_resource_claims(parent_id);

-- Persisted grants (written by the token service)
CREATE TABLE IF NOT EXISTS persisted_grants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    grant_type TEXT NOT NULL,
    subject_id TEXT,
    session_id TEXT,
    client_id TEXT NOT NULL,
    description TEXT,
    creation_time TEXT NOT NULL,
    expiration TEXT,
    consumed_time TEXT,
    data TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_persisted_grants_subject ON persisted_grants(subject_id);
CREATE INDEX IF NOT EXISTS idx_persisted_grants_client ON persisted_grants(client_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp_dir.path().join("meta.db"), None, 5000)
            .await
            .unwrap();

        store.migrate().await.unwrap();
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(temp_dir.path().join("meta.db"), None, 5000)
            .await
            .unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            sqlx::query(
                "INSERT INTO api_scopes (name, enabled, required, emphasize, show_in_discovery_document) \
                 VALUES ('orders.read', 1, 0, 0, 1)",
            )
            .execute(uow.conn())
            .await
            .unwrap();
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_scopes")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
