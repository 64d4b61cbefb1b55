use super::SqliteStore;
use super::rows;
use crate::error::{MetadataError, MetadataResult};
use crate::models::PersistedGrant;
use crate::repos::PersistedGrantRepo;
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::paging::{LIKE_ESCAPE, like_pattern};
use gatehouse_core::{Page, PagedList, SortOrder, SurrogateKey};

fn order_clause(page: Page) -> &'static str {
    match page.order() {
        SortOrder::Id => "id",
        SortOrder::Name => "subject_id, id",
    }
}

#[async_trait]
impl PersistedGrantRepo for SqliteStore {
    async fn get_persisted_grants_by_subjects(
        &self,
        search: &str,
        page: Page,
    ) -> MetadataResult<PagedList<PersistedGrant>> {
        let pattern = like_pattern(search);
        // Grants without a subject only match the empty search.
        let filter = format!("COALESCE(subject_id, '') LIKE ? ESCAPE '{LIKE_ESCAPE}'");

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM persisted_grants WHERE {filter}"
        ))
        .bind(&pattern)
        .fetch_one(self.pool())
        .await?;

        let sql = format!(
            "SELECT * FROM persisted_grants WHERE {filter} ORDER BY {} LIMIT ? OFFSET ?",
            order_clause(page)
        );
        let items = sqlx::query_as::<_, PersistedGrant>(&sql)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;

        tracing::debug!(search, total, "persisted grants listed");
        Ok(PagedList::new(items, total as u64, page))
    }

    async fn get_persisted_grants_by_subject(
        &self,
        subject_id: &str,
        page: Page,
    ) -> MetadataResult<PagedList<PersistedGrant>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM persisted_grants WHERE subject_id = ?")
                .bind(subject_id)
                .fetch_one(self.pool())
                .await?;

        let sql = format!(
            "SELECT * FROM persisted_grants WHERE subject_id = ? ORDER BY {} LIMIT ? OFFSET ?",
            order_clause(page)
        );
        let items = sqlx::query_as::<_, PersistedGrant>(&sql)
            .bind(subject_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool())
            .await?;

        Ok(PagedList::new(items, total as u64, page))
    }

    async fn get_persisted_grant(&self, key: &str) -> MetadataResult<Option<PersistedGrant>> {
        let row =
            sqlx::query_as::<_, PersistedGrant>("SELECT * FROM persisted_grants WHERE key = ?")
                .bind(key)
                .fetch_optional(self.pool())
                .await?;
        Ok(row)
    }

    async fn exists_persisted_grants_for_subject(&self, subject_id: &str) -> MetadataResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM persisted_grants WHERE subject_id = ?)",
        )
        .bind(subject_id)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    async fn add_persisted_grant(
        &self,
        uow: &mut UnitOfWork,
        grant: &PersistedGrant,
    ) -> MetadataResult<SurrogateKey> {
        let result = sqlx::query(
            r#"
            INSERT INTO persisted_grants (
                key, grant_type, subject_id, session_id, client_id, description,
                creation_time, expiration, consumed_time, data
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&grant.key)
        .bind(&grant.grant_type)
        .bind(&grant.subject_id)
        .bind(&grant.session_id)
        .bind(&grant.client_id)
        .bind(&grant.description)
        .bind(grant.creation_time)
        .bind(grant.expiration)
        .bind(grant.consumed_time)
        .bind(&grant.data)
        .execute(uow.conn())
        .await
        .map_err(|e| MetadataError::from_insert(e, || rows::key_detail(grant)))?;

        uow.record(1);
        let id = result.last_insert_rowid();
        tracing::debug!(id, client_id = %grant.client_id, grant_type = %grant.grant_type, "persisted grant stored");
        Ok(id)
    }

    async fn delete_persisted_grant(&self, uow: &mut UnitOfWork, key: &str) -> MetadataResult<u64> {
        let result = sqlx::query("DELETE FROM persisted_grants WHERE key = ?")
            .bind(key)
            .execute(uow.conn())
            .await?;
        let removed = result.rows_affected();
        uow.record(removed);
        tracing::info!(rows = removed, "persisted grant delete");
        Ok(removed)
    }

    async fn delete_persisted_grants_by_subject(
        &self,
        uow: &mut UnitOfWork,
        subject_id: &str,
    ) -> MetadataResult<u64> {
        let result = sqlx::query("DELETE FROM persisted_grants WHERE subject_id = ?")
            .bind(subject_id)
            .execute(uow.conn())
            .await?;
        let removed = result.rows_affected();
        uow.record(removed);
        tracing::info!(subject_id, rows = removed, "persisted grants deleted for subject");
        Ok(removed)
    }
}
