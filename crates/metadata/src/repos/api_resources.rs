//! API resource repository trait.

use crate::error::MetadataResult;
use crate::models::{ApiResource, Owned, Property, Secret};
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::{Page, PagedList, SurrogateKey};

/// Repository for API resources.
#[async_trait]
pub trait ApiResourceRepo: Send + Sync {
    async fn get_api_resources(
        &self,
        search: &str,
        page: Page,
    ) -> MetadataResult<PagedList<ApiResource>>;

    async fn get_api_resource(&self, id: SurrogateKey) -> MetadataResult<Option<ApiResource>>;

    async fn get_api_resource_name(&self, id: SurrogateKey) -> MetadataResult<Option<String>>;

    async fn get_api_resource_names(&self, search: &str, limit: u32)
    -> MetadataResult<Vec<String>>;

    async fn can_insert_api_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &ApiResource,
    ) -> MetadataResult<bool>;

    async fn add_api_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &ApiResource,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_api_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &ApiResource,
    ) -> MetadataResult<()>;

    async fn delete_api_resource(
        &self,
        uow: &mut UnitOfWork,
        id: SurrogateKey,
    ) -> MetadataResult<()>;

    // Secrets

    async fn get_api_resource_secrets(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Secret>>;

    async fn get_api_resource_secret(
        &self,
        secret_id: SurrogateKey,
    ) -> MetadataResult<Owned<Secret>>;

    async fn add_api_resource_secret(
        &self,
        uow: &mut UnitOfWork,
        resource_id: SurrogateKey,
        secret: &Secret,
    ) -> MetadataResult<SurrogateKey>;

    async fn delete_api_resource_secret(
        &self,
        uow: &mut UnitOfWork,
        secret_id: SurrogateKey,
    ) -> MetadataResult<()>;

    // Properties

    async fn get_api_resource_properties(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>>;

    async fn get_api_resource_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>>;

    async fn add_api_resource_property(
        &self,
        uow: &mut UnitOfWork,
        resource_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_api_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()>;

    async fn delete_api_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()>;
}
