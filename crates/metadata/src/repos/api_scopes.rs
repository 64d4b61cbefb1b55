//! API scope repository trait.

use crate::error::MetadataResult;
use crate::models::{ApiScope, Owned, Property};
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::{Page, PagedList, SurrogateKey};

/// Repository for API scopes.
#[async_trait]
pub trait ApiScopeRepo: Send + Sync {
    async fn get_api_scopes(&self, search: &str, page: Page)
    -> MetadataResult<PagedList<ApiScope>>;

    async fn get_api_scope(&self, id: SurrogateKey) -> MetadataResult<Option<ApiScope>>;

    async fn get_api_scope_name(&self, id: SurrogateKey) -> MetadataResult<Option<String>>;

    async fn get_api_scope_names(&self, search: &str, limit: u32) -> MetadataResult<Vec<String>>;

    async fn can_insert_api_scope(
        &self,
        uow: &mut UnitOfWork,
        scope: &ApiScope,
    ) -> MetadataResult<bool>;

    async fn add_api_scope(
        &self,
        uow: &mut UnitOfWork,
        scope: &ApiScope,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_api_scope(&self, uow: &mut UnitOfWork, scope: &ApiScope)
    -> MetadataResult<()>;

    async fn delete_api_scope(&self, uow: &mut UnitOfWork, id: SurrogateKey)
    -> MetadataResult<()>;

    // Properties

    async fn get_api_scope_properties(
        &self,
        scope_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>>;

    async fn get_api_scope_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>>;

    async fn add_api_scope_property(
        &self,
        uow: &mut UnitOfWork,
        scope_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_api_scope_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()>;

    async fn delete_api_scope_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()>;
}
