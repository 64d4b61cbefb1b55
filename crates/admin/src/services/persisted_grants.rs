//! Persisted grant administration.
//!
//! Grants are written by the token service; this service only reads and
//! revokes them. Deletes are idempotent and emit an audit event only when a
//! row was actually removed.

use crate::audit::{AuditEntity, AuditEvent};
use crate::context::AdminContext;
use crate::dtos::PersistedGrantDto;
use crate::error::{AdminError, AdminResult, ResourceCode};
use crate::mappers;
use gatehouse_core::aggregate::validate_key;
use gatehouse_core::{Page, PagedList};
use gatehouse_metadata::repos::PersistedGrantRepo;
use serde_json::json;

pub struct PersistedGrantService {
    ctx: AdminContext,
}

impl PersistedGrantService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Grants whose subject matches `search` (`*` wildcards allowed).
    pub async fn get_persisted_grants_by_subjects(
        &self,
        search: &str,
        page: Page,
    ) -> AdminResult<PagedList<PersistedGrantDto>> {
        let grants = self
            .ctx
            .store()
            .get_persisted_grants_by_subjects(search, page)
            .await?;
        tracing::debug!(search, total = grants.total_count, "listed persisted grants");
        Ok(grants.map(|g| mappers::persisted_grant_to_dto(&g)))
    }

    pub async fn get_persisted_grants_by_subject(
        &self,
        subject_id: &str,
        page: Page,
    ) -> AdminResult<PagedList<PersistedGrantDto>> {
        validate_key("subject_id", subject_id)?;
        let grants = self
            .ctx
            .store()
            .get_persisted_grants_by_subject(subject_id, page)
            .await?;
        Ok(grants.map(|g| mappers::persisted_grant_to_dto(&g)))
    }

    pub async fn get_persisted_grant(&self, key: &str) -> AdminResult<PersistedGrantDto> {
        let grant = self
            .ctx
            .store()
            .get_persisted_grant(key)
            .await?
            .ok_or_else(|| {
                AdminError::not_found(
                    ResourceCode::PersistedGrantDoesNotExist,
                    format!("persisted grant '{key}'"),
                )
            })?;
        Ok(mappers::persisted_grant_to_dto(&grant))
    }

    pub async fn exists_persisted_grants_for_subject(&self, subject_id: &str) -> AdminResult<bool> {
        Ok(self
            .ctx
            .store()
            .exists_persisted_grants_for_subject(subject_id)
            .await?)
    }

    /// Delete the grant with `key`. Returns the number of rows removed (0 or 1).
    pub async fn delete_persisted_grant(&self, key: &str) -> AdminResult<u64> {
        let store = self.ctx.store();
        let before = store.get_persisted_grant(key).await?;

        let mut uow = store.begin().await?;
        let removed = store.delete_persisted_grant(&mut uow, key).await?;
        uow.commit().await?;

        if removed == 0 {
            tracing::debug!(key, "persisted grant already gone");
            return Ok(0);
        }

        tracing::info!(key, actor = self.ctx.actor(), "persisted grant deleted");
        let mut record = self.ctx.record(AuditEntity::PersistedGrant, key);
        if let Some(grant) = before {
            record = record.with_before(&mappers::persisted_grant_to_dto(&grant));
        }
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(removed)
    }

    /// Delete every grant of `subject_id` and return how many were removed.
    pub async fn delete_persisted_grants_by_subject(&self, subject_id: &str) -> AdminResult<u64> {
        validate_key("subject_id", subject_id)?;
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let removed = store
            .delete_persisted_grants_by_subject(&mut uow, subject_id)
            .await?;
        uow.commit().await?;

        if removed == 0 {
            return Ok(0);
        }

        tracing::info!(subject_id, removed, actor = self.ctx.actor(), "persisted grants deleted");
        let record = self
            .ctx
            .record(AuditEntity::PersistedGrant, subject_id)
            .with_before(&json!({ "subject_id": subject_id, "removed": removed }));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(removed)
    }
}
