//! Service test harness over a temporary SQLite store.

use gatehouse_admin::{
    AdminContext, ApiResourceService, ApiScopeService, AuditSink, ClientService,
    IdentityResourceService, MemoryAuditSink, PersistedGrantService,
};
use gatehouse_metadata::{MetadataStore, SqliteStore};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tempfile::TempDir;

/// Every table of the schema, for before/after row-count comparisons.
#[allow(dead_code)]
pub const TABLES: &[&str] = &[
    "clients",
    "client_secrets",
    "client_claims",
    "client_properties",
    "client_redirect_uris",
    "client_post_logout_redirect_uris",
    "client_scopes",
    "client_grant_types",
    "client_cors_origins",
    "client_idp_restrictions",
    "api_resources",
    "api_resource_secrets",
    "api_resource_properties",
    "api_resource_claims",
    "api_resource_scopes",
    "api_scopes",
    "api_scope_properties",
    "api_scope_claims",
    "identity_resources",
    "identity_resource_properties",
    "identity_resource_claims",
    "persisted_grants",
];

/// Services wired to a fresh store and an in-memory audit sink.
#[allow(dead_code)]
pub struct TestAdmin {
    pub store: Arc<dyn MetadataStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub ctx: AdminContext,
    sqlite_store: Arc<SqliteStore>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestAdmin {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("admin.db");
        let sqlite_store = Arc::new(
            SqliteStore::new(&db_path, None, 5000)
                .await
                .expect("Failed to open store"),
        );
        let store: Arc<dyn MetadataStore> = sqlite_store.clone();
        let audit = Arc::new(MemoryAuditSink::new());
        let sink: Arc<dyn AuditSink> = audit.clone();
        let ctx = AdminContext::new(store.clone(), sink).with_actor("tester");

        Self {
            store,
            audit,
            ctx,
            sqlite_store,
            _temp_dir: temp_dir,
        }
    }

    pub fn clients(&self) -> ClientService {
        ClientService::new(self.ctx.clone())
    }

    pub fn api_resources(&self) -> ApiResourceService {
        ApiResourceService::new(self.ctx.clone())
    }

    pub fn api_scopes(&self) -> ApiScopeService {
        ApiScopeService::new(self.ctx.clone())
    }

    pub fn identity_resources(&self) -> IdentityResourceService {
        IdentityResourceService::new(self.ctx.clone())
    }

    pub fn grants(&self) -> PersistedGrantService {
        PersistedGrantService::new(self.ctx.clone())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        self.sqlite_store.pool()
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.pool())
            .await
            .expect("count query failed")
    }

    /// Row count of every table, in [`TABLES`] order.
    pub async fn table_counts(&self) -> Vec<(&'static str, i64)> {
        let mut counts = Vec::with_capacity(TABLES.len());
        for table in TABLES {
            counts.push((*table, self.count(table).await));
        }
        counts
    }
}
