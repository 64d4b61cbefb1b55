//! Identity resource repository trait.

use crate::error::MetadataResult;
use crate::models::{IdentityResource, Owned, Property};
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::{Page, PagedList, SurrogateKey};

/// Repository for identity resources.
#[async_trait]
pub trait IdentityResourceRepo: Send + Sync {
    async fn get_identity_resources(
        &self,
        search: &str,
        page: Page,
    ) -> MetadataResult<PagedList<IdentityResource>>;

    async fn get_identity_resource(
        &self,
        id: SurrogateKey,
    ) -> MetadataResult<Option<IdentityResource>>;

    async fn get_identity_resource_name(&self, id: SurrogateKey)
    -> MetadataResult<Option<String>>;

    async fn get_identity_resource_names(
        &self,
        search: &str,
        limit: u32,
    ) -> MetadataResult<Vec<String>>;

    async fn can_insert_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &IdentityResource,
    ) -> MetadataResult<bool>;

    async fn add_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &IdentityResource,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &IdentityResource,
    ) -> MetadataResult<()>;

    async fn delete_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        id: SurrogateKey,
    ) -> MetadataResult<()>;

    // Properties

    async fn get_identity_resource_properties(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>>;

    async fn get_identity_resource_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>>;

    async fn add_identity_resource_property(
        &self,
        uow: &mut UnitOfWork,
        resource_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_identity_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()>;

    async fn delete_identity_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()>;
}
