//! API resource administration.

use crate::audit::{AuditEntity, AuditEvent};
use crate::clone::{ApiResourceCollection, ClonePolicy, clone_aggregate};
use crate::context::AdminContext;
use crate::dtos::{ApiResourceDto, OwnedDto, PropertyDto, SecretDto};
use crate::error::{AdminError, AdminResult, Coded, ResourceCode};
use crate::mappers;
use gatehouse_core::aggregate::validate_key;
use gatehouse_core::{Page, PagedList, SurrogateKey};
use gatehouse_metadata::models::ApiResource;
use gatehouse_metadata::repos::ApiResourceRepo;
use time::OffsetDateTime;

use ResourceCode::{ApiResourceDoesNotExist, ApiResourceExistsValue};

pub struct ApiResourceService {
    ctx: AdminContext,
}

impl ApiResourceService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    pub async fn get_api_resources(
        &self,
        search: &str,
        page: Page,
    ) -> AdminResult<PagedList<ApiResourceDto>> {
        let resources = self.ctx.store().get_api_resources(search, page).await?;
        tracing::debug!(search, total = resources.total_count, "listed api resources");
        Ok(resources.map(|r| mappers::api_resource_to_dto(&r)))
    }

    pub async fn get_api_resource(&self, id: SurrogateKey) -> AdminResult<ApiResourceDto> {
        let resource = self.load(id).await?;
        Ok(mappers::api_resource_to_dto(&resource))
    }

    pub async fn get_api_resource_names(
        &self,
        search: &str,
        limit: u32,
    ) -> AdminResult<Vec<String>> {
        Ok(self
            .ctx
            .store()
            .get_api_resource_names(search, limit)
            .await?)
    }

    pub async fn add_api_resource(&self, dto: &ApiResourceDto) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::ApiResourcePropertyExistsValue,
        )?;
        let mut resource = mappers::api_resource_from_dto(dto, OffsetDateTime::now_utc());
        mappers::require_secret_values(&resource.secrets)?;
        let id = self.insert(&resource).await?;
        resource.id = id;

        tracing::info!(id, name = %resource.name, actor = self.ctx.actor(), "api resource added");
        let record = self
            .ctx
            .record(AuditEntity::ApiResource, &resource.name)
            .with_after(&mappers::api_resource_to_dto(&resource));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_api_resource(&self, dto: &ApiResourceDto) -> AdminResult<()> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::ApiResourcePropertyExistsValue,
        )?;
        let before = self.load(dto.id).await?;

        let now = OffsetDateTime::now_utc();
        let mut resource = mappers::api_resource_from_dto(dto, now);
        resource.created = before.created;
        resource.updated = Some(now);
        mappers::adopt_api_resource_ids(&mut resource, &before);
        mappers::require_secret_values(&resource.secrets)?;

        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        store
            .update_api_resource(&mut uow, &resource)
            .await
            .coded(ApiResourceDoesNotExist, ApiResourceExistsValue)?;
        uow.commit().await?;

        tracing::info!(id = resource.id, name = %resource.name, actor = self.ctx.actor(), "api resource updated");
        let record = self
            .ctx
            .record(AuditEntity::ApiResource, &resource.name)
            .with_before(&mappers::api_resource_to_dto(&before))
            .with_after(&mappers::api_resource_to_dto(&resource));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_api_resource(&self, id: SurrogateKey) -> AdminResult<()> {
        let before = self.load(id).await?;
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        store
            .delete_api_resource(&mut uow, id)
            .await
            .missing(ApiResourceDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id, name = %before.name, actor = self.ctx.actor(), "api resource deleted");
        let record = self
            .ctx
            .record(AuditEntity::ApiResource, &before.name)
            .with_before(&mappers::api_resource_to_dto(&before));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    pub async fn clone_api_resource(
        &self,
        source_id: SurrogateKey,
        name: &str,
    ) -> AdminResult<SurrogateKey> {
        let policy = self.ctx.clone_policy();
        self.clone_api_resource_with(source_id, name, &policy).await
    }

    pub async fn clone_api_resource_with(
        &self,
        source_id: SurrogateKey,
        name: &str,
        policy: &ClonePolicy<ApiResourceCollection>,
    ) -> AdminResult<SurrogateKey> {
        validate_key("name", name)?;
        let source = self.load(source_id).await?;
        let mut clone =
            clone_aggregate(&source, name.to_string(), policy, OffsetDateTime::now_utc());
        let id = self.insert(&clone).await?;
        clone.id = id;

        tracing::info!(source_id, id, name, actor = self.ctx.actor(), "api resource cloned");
        let record = self
            .ctx
            .record(AuditEntity::ApiResource, name)
            .with_before(&mappers::api_resource_to_dto(&source))
            .with_after(&mappers::api_resource_to_dto(&clone));
        self.ctx.emit(AuditEvent::Cloned(record)).await;
        Ok(id)
    }

    // =========================================================================
    // Secrets
    // =========================================================================

    pub async fn get_api_resource_secrets(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> AdminResult<PagedList<SecretDto>> {
        self.resource_name(resource_id).await?;
        let secrets = self
            .ctx
            .store()
            .get_api_resource_secrets(resource_id, page)
            .await?;
        Ok(secrets.map(|s| mappers::secret_to_dto(&s)))
    }

    pub async fn get_api_resource_secret(
        &self,
        secret_id: SurrogateKey,
    ) -> AdminResult<OwnedDto<SecretDto>> {
        let owned = self
            .ctx
            .store()
            .get_api_resource_secret(secret_id)
            .await
            .missing(ResourceCode::ApiResourceSecretDoesNotExist)?;
        let parent_key = self.resource_name(owned.parent_id).await?;
        Ok(mappers::owned_to_dto(&owned, parent_key, mappers::secret_to_dto))
    }

    pub async fn add_api_resource_secret(
        &self,
        resource_id: SurrogateKey,
        dto: &SecretDto,
    ) -> AdminResult<SurrogateKey> {
        dto.validate_new()?;
        let parent_key = self.resource_name(resource_id).await?;
        let mut secret = mappers::secret_from_dto(dto, OffsetDateTime::now_utc());
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let id = store
            .add_api_resource_secret(&mut uow, resource_id, &secret)
            .await
            .missing(ApiResourceDoesNotExist)?;
        uow.commit().await?;
        secret.id = id;

        tracing::info!(id, api_resource = %parent_key, actor = self.ctx.actor(), "api resource secret added");
        let record = self
            .ctx
            .record(AuditEntity::ApiResourceSecret, id)
            .with_parent(parent_key)
            .with_after(&mappers::secret_to_dto(&secret));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn delete_api_resource_secret(&self, secret_id: SurrogateKey) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_api_resource_secret(secret_id)
            .await
            .missing(ResourceCode::ApiResourceSecretDoesNotExist)?;
        let parent_key = self.resource_name(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_api_resource_secret(&mut uow, secret_id)
            .await
            .missing(ResourceCode::ApiResourceSecretDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = secret_id, api_resource = %parent_key, actor = self.ctx.actor(), "api resource secret deleted");
        let record = self
            .ctx
            .record(AuditEntity::ApiResourceSecret, secret_id)
            .with_parent(parent_key)
            .with_before(&mappers::secret_to_dto(&before.item));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub async fn get_api_resource_properties(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> AdminResult<PagedList<PropertyDto>> {
        self.resource_name(resource_id).await?;
        let properties = self
            .ctx
            .store()
            .get_api_resource_properties(resource_id, page)
            .await?;
        Ok(properties.map(|p| mappers::property_to_dto(&p)))
    }

    pub async fn get_api_resource_property(
        &self,
        property_id: SurrogateKey,
    ) -> AdminResult<OwnedDto<PropertyDto>> {
        let owned = self
            .ctx
            .store()
            .get_api_resource_property(property_id)
            .await
            .missing(ResourceCode::ApiResourcePropertyDoesNotExist)?;
        let parent_key = self.resource_name(owned.parent_id).await?;
        Ok(mappers::owned_to_dto(&owned, parent_key, mappers::property_to_dto))
    }

    pub async fn add_api_resource_property(
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
            .add_api_resource_property(&mut uow, resource_id, &property)
            .await
            .coded(
                ApiResourceDoesNotExist,
                ResourceCode::ApiResourcePropertyExistsValue,
            )?;
        uow.commit().await?;
        property.id = id;

        tracing::info!(id, api_resource = %parent_key, key = %property.key, actor = self.ctx.actor(), "api resource property added");
        let record = self
            .ctx
            .record(AuditEntity::ApiResourceProperty, id)
            .with_parent(parent_key)
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_api_resource_property(&self, dto: &PropertyDto) -> AdminResult<()> {
        dto.validate()?;
        let store = self.ctx.store();
        let before = store
            .get_api_resource_property(dto.id)
            .await
            .missing(ResourceCode::ApiResourcePropertyDoesNotExist)?;
        let parent_key = self.resource_name(before.parent_id).await?;
        let property = mappers::property_from_dto(dto);

        let mut uow = store.begin().await?;
        store
            .update_api_resource_property(&mut uow, &property)
            .await
            .coded(
                ResourceCode::ApiResourcePropertyDoesNotExist,
                ResourceCode::ApiResourcePropertyExistsValue,
            )?;
        uow.commit().await?;

        tracing::info!(id = property.id, api_resource = %parent_key, actor = self.ctx.actor(), "api resource property updated");
        let record = self
            .ctx
            .record(AuditEntity::ApiResourceProperty, property.id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item))
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_api_resource_property(&self, property_id: SurrogateKey) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_api_resource_property(property_id)
            .await
            .missing(ResourceCode::ApiResourcePropertyDoesNotExist)?;
        let parent_key = self.resource_name(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_api_resource_property(&mut uow, property_id)
            .await
            .missing(ResourceCode::ApiResourcePropertyDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = property_id, api_resource = %parent_key, actor = self.ctx.actor(), "api resource property deleted");
        let record = self
            .ctx
            .record(AuditEntity::ApiResourceProperty, property_id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Insert a new resource after checking its name inside the same unit of
    /// work.
    async fn insert(&self, resource: &ApiResource) -> AdminResult<SurrogateKey> {
        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        if !store.can_insert_api_resource(&mut uow, resource).await? {
            tracing::warn!(name = %resource.name, "api resource name already in use");
            return Err(AdminError::conflict(
                ApiResourceExistsValue,
                format!("api resource '{}'", resource.name),
            ));
        }
        let id = store
            .add_api_resource(&mut uow, resource)
            .await
            .coded(ApiResourceDoesNotExist, ApiResourceExistsValue)?;
        uow.commit().await?;
        Ok(id)
    }

    async fn load(&self, id: SurrogateKey) -> AdminResult<ApiResource> {
        self.ctx
            .store()
            .get_api_resource(id)
            .await?
            .ok_or_else(|| {
                AdminError::not_found(ApiResourceDoesNotExist, format!("api resource {id}"))
            })
    }

    async fn resource_name(&self, id: SurrogateKey) -> AdminResult<String> {
        self.ctx
            .store()
            .get_api_resource_name(id)
            .await?
            .ok_or_else(|| {
                AdminError::not_found(ApiResourceDoesNotExist, format!("api resource {id}"))
            })
    }
}
