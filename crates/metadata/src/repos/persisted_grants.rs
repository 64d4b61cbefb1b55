//! Persisted grant repository trait.

use crate::error::MetadataResult;
use crate::models::PersistedGrant;
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::{Page, PagedList, SurrogateKey};

/// Repository for grants written by the token service.
#[async_trait]
pub trait PersistedGrantRepo: Send + Sync {
    /// Page through grants whose subject id matches `search`.
    async fn get_persisted_grants_by_subjects(
        &self,
        search: &str,
        page: Page,
    ) -> MetadataResult<PagedList<PersistedGrant>>;

    /// Page through the grants of one subject.
    async fn get_persisted_grants_by_subject(
        &self,
        subject_id: &str,
        page: Page,
    ) -> MetadataResult<PagedList<PersistedGrant>>;

    async fn get_persisted_grant(&self, key: &str) -> MetadataResult<Option<PersistedGrant>>;

    /// Whether any grant exists for the subject.
    async fn exists_persisted_grants_for_subject(&self, subject_id: &str) -> MetadataResult<bool>;

    /// Store a grant. Fails with `AlreadyExists` when the key is taken.
    async fn add_persisted_grant(
        &self,
        uow: &mut UnitOfWork,
        grant: &PersistedGrant,
    ) -> MetadataResult<SurrogateKey>;

    /// Delete a grant by key. Returns the number of rows removed (0 or 1).
    async fn delete_persisted_grant(&self, uow: &mut UnitOfWork, key: &str)
    -> MetadataResult<u64>;

    /// Delete every grant of a subject. Returns the number of rows removed.
    async fn delete_persisted_grants_by_subject(
        &self,
        uow: &mut UnitOfWork,
        subject_id: &str,
    ) -> MetadataResult<u64>;
}
