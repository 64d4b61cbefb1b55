//! Identity resource administration.

use crate::audit::{AuditEntity, AuditEvent};
use crate::clone::{ClonePolicy, IdentityResourceCollection, clone_aggregate};
use crate::context::AdminContext;
use crate::dtos::{IdentityResourceDto, OwnedDto, PropertyDto};
use crate::error::{AdminError, AdminResult, Coded, ResourceCode};
use crate::mappers;
use gatehouse_core::aggregate::validate_key;
use gatehouse_core::{Page, PagedList, SurrogateKey};
use gatehouse_metadata::models::IdentityResource;
use gatehouse_metadata::repos::IdentityResourceRepo;
use time::OffsetDateTime;

use ResourceCode::{
    IdentityResourceDoesNotExist, IdentityResourceExistsValue,
    IdentityResourcePropertyDoesNotExist, IdentityResourcePropertyExistsValue,
};

pub struct IdentityResourceService {
    ctx: AdminContext,
}

impl IdentityResourceService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    pub async fn get_identity_resources(
        &self,
        search: &str,
        page: Page,
    ) -> AdminResult<PagedList<IdentityResourceDto>> {
        let resources = self
            .ctx
            .store()
            .get_identity_resources(search, page)
            .await?;
        tracing::debug!(search, total = resources.total_count, "listed identity resources");
        Ok(resources.map(|r| mappers::identity_resource_to_dto(&r)))
    }

    pub async fn get_identity_resource(&self, id: SurrogateKey) -> AdminResult<IdentityResourceDto> {
        let resource = self.load(id).await?;
        Ok(mappers::identity_resource_to_dto(&resource))
    }

    pub async fn get_identity_resource_names(
        &self,
        search: &str,
        limit: u32,
    ) -> AdminResult<Vec<String>> {
        Ok(self
            .ctx
            .store()
            .get_identity_resource_names(search, limit)
            .await?)
    }

    pub async fn add_identity_resource(
        &self,
        dto: &IdentityResourceDto,
    ) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::IdentityResourcePropertyExistsValue,
        )?;
        let mut resource = mappers::identity_resource_from_dto(dto, OffsetDateTime::now_utc());
        let id = self.insert(&resource).await?;
        resource.id = id;

        tracing::info!(id, name = %resource.name, actor = self.ctx.actor(), "identity resource added");
        let record = self
            .ctx
            .record(AuditEntity::IdentityResource, &resource.name)
            .with_after(&mappers::identity_resource_to_dto(&resource));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_identity_resource(&self, dto: &IdentityResourceDto) -> AdminResult<()> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::IdentityResourcePropertyExistsValue,
        )?;
        let before = self.load(dto.id).await?;

        let now = OffsetDateTime::now_utc();
        let mut resource = mappers::identity_resource_from_dto(dto, now);
        resource.created = before.created;
        resource.updated = Some(now);
        mappers::adopt_identity_resource_ids(&mut resource, &before);

        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        store
            .update_identity_resource(&mut uow, &resource)
            .await
            .coded(IdentityResourceDoesNotExist, IdentityResourceExistsValue)?;
        uow.commit().await?;

        tracing::info!(id = resource.id, name = %resource.name, actor = self.ctx.actor(), "identity resource updated");
        let record = self
            .ctx
            .record(AuditEntity::IdentityResource, &resource.name)
            .with_before(&mappers::identity_resource_to_dto(&before))
            .with_after(&mappers::identity_resource_to_dto(&resource));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_identity_resource(&self, id: SurrogateKey) -> AdminResult<()> {
        let before = self.load(id).await?;
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        store
            .delete_identity_resource(&mut uow, id)
            .await
            .missing(IdentityResourceDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id, name = %before.name, actor = self.ctx.actor(), "identity resource deleted");
        let record = self
            .ctx
            .record(AuditEntity::IdentityResource, &before.name)
            .with_before(&mappers::identity_resource_to_dto(&before));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    pub async fn clone_identity_resource(
        &self,
        source_id: SurrogateKey,
        name: &str,
    ) -> AdminResult<SurrogateKey> {
        let policy = self.ctx.clone_policy();
        self.clone_identity_resource_with(source_id, name, &policy)
            .await
    }

    pub async fn clone_identity_resource_with(
        &self,
        source_id: SurrogateKey,
        name: &str,
        policy: &ClonePolicy<IdentityResourceCollection>,
    ) -> AdminResult<SurrogateKey> {
        validate_key("name", name)?;
        let source = self.load(source_id).await?;
        let mut clone =
            clone_aggregate(&source, name.to_string(), policy, OffsetDateTime::now_utc());
        let id = self.insert(&clone).await?;
        clone.id = id;

        tracing::info!(source_id, id, name, actor = self.ctx.actor(), "identity resource cloned");
        let record = self
            .ctx
            .record(AuditEntity::IdentityResource, name)
            .with_before(&mappers::identity_resource_to_dto(&source))
            .with_after(&mappers::identity_resource_to_dto(&clone));
        self.ctx.emit(AuditEvent::Cloned(record)).await;
        Ok(id)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub async fn get_identity_resource_properties(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> AdminResult<PagedList<PropertyDto>> {
        self.resource_name(resource_id).await?;
        let properties = self
            .ctx
            .store()
            .get_identity_resource_properties(resource_id, page)
            .await?;
        Ok(properties.map(|p| mappers::property_to_dto(&p)))
    }

    pub async fn get_identity_resource_property(
        &self,
        property_id: SurrogateKey,
    ) -> AdminResult<OwnedDto<PropertyDto>> {
        let owned = self
            .ctx
            .store()
            .get_identity_resource_property(property_id)
            .await
            .missing(IdentityResourcePropertyDoesNotExist)?;
        let parent_key = self.resource_name(owned.parent_id).await?;
        Ok(mappers::owned_to_dto(&owned, parent_key, mappers::property_to_dto))
    }

    pub async fn add_identity_resource_property(
        &self,
        resource_id: SurrogateKey,
        dto: &PropertyDto,
    ) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        let parent_key = self.resource_name(resource_id).await?;
        let mut property = mappers::property_from_dto(dto);
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let id = store
            .add_identity_resource_property(&mut uow, resource_id, &property)
            .await
            .coded(
                IdentityResourceDoesNotExist,
                IdentityResourcePropertyExistsValue,
            )?;
        uow.commit().await?;
        property.id = id;

        tracing::info!(id, identity_resource = %parent_key, key = %property.key, actor = self.ctx.actor(), "identity resource property added");
        let record = self
            .ctx
            .record(AuditEntity::IdentityResourceProperty, id)
            .with_parent(parent_key)
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_identity_resource_property(&self, dto: &PropertyDto) -> AdminResult<()> {
        dto.validate()?;
        let store = self.ctx.store();
        let before = store
            .get_identity_resource_property(dto.id)
            .await
            .missing(IdentityResourcePropertyDoesNotExist)?;
        let parent_key = self.resource_name(before.parent_id).await?;
        let property = mappers::property_from_dto(dto);

        let mut uow = store.begin().await?;
        store
            .update_identity_resource_property(&mut uow, &property)
            .await
            .coded(
                IdentityResourcePropertyDoesNotExist,
                IdentityResourcePropertyExistsValue,
            )?;
        uow.commit().await?;

        tracing::info!(id = property.id, identity_resource = %parent_key, actor = self.ctx.actor(), "identity resource property updated");
        let record = self
            .ctx
            .record(AuditEntity::IdentityResourceProperty, property.id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item))
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_identity_resource_property(
        &self,
        property_id: SurrogateKey,
    ) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_identity_resource_property(property_id)
            .await
            .missing(IdentityResourcePropertyDoesNotExist)?;
        let parent_key = self.resource_name(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_identity_resource_property(&mut uow, property_id)
            .await
            .missing(IdentityResourcePropertyDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = property_id, identity_resource = %parent_key, actor = self.ctx.actor(), "identity resource property deleted");
        let record = self
            .ctx
            .record(AuditEntity::IdentityResourceProperty, property_id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn insert(&self, resource: &IdentityResource) -> AdminResult<SurrogateKey> {
        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        if !store.can_insert_identity_resource(&mut uow, resource).await? {
            tracing::warn!(name = %resource.name, "identity resource name already in use");
            return Err(AdminError::conflict(
                IdentityResourceExistsValue,
                format!("identity resource '{}'", resource.name),
            ));
        }
        let id = store
            .add_identity_resource(&mut uow, resource)
            .await
            .coded(IdentityResourceDoesNotExist, IdentityResourceExistsValue)?;
        uow.commit().await?;
        Ok(id)
    }

    async fn load(&self, id: SurrogateKey) -> AdminResult<IdentityResource> {
        self.ctx
            .store()
            .get_identity_resource(id)
            .await?
            .ok_or_else(|| {
                AdminError::not_found(
                    IdentityResourceDoesNotExist,
                    format!("identity resource {id}"),
                )
            })
    }

    async fn resource_name(&self, id: SurrogateKey) -> AdminResult<String> {
        self.ctx
            .store()
            .get_identity_resource_name(id)
            .await?
            .ok_or_else(|| {
                AdminError::not_found(
                    IdentityResourceDoesNotExist,
                    format!("identity resource {id}"),
                )
            })
    }
}
