//! API scope administration.

use crate::audit::{AuditEntity, AuditEvent};
use crate::clone::{ApiScopeCollection, ClonePolicy, clone_aggregate};
use crate::context::AdminContext;
use crate::dtos::{ApiScopeDto, OwnedDto, PropertyDto};
use crate::error::{AdminError, AdminResult, Coded, ResourceCode};
use crate::mappers;
use gatehouse_core::aggregate::validate_key;
use gatehouse_core::{Page, PagedList, SurrogateKey};
use gatehouse_metadata::models::ApiScope;
use gatehouse_metadata::repos::ApiScopeRepo;
use time::OffsetDateTime;

use ResourceCode::{
    ApiScopeDoesNotExist, ApiScopeExistsValue, ApiScopePropertyDoesNotExist,
    ApiScopePropertyExistsValue,
};

pub struct ApiScopeService {
    ctx: AdminContext,
}

impl ApiScopeService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    pub async fn get_api_scopes(
        &self,
        search: &str,
        page: Page,
    ) -> AdminResult<PagedList<ApiScopeDto>> {
        let scopes = self.ctx.store().get_api_scopes(search, page).await?;
        tracing::debug!(search, total = scopes.total_count, "listed api scopes");
        Ok(scopes.map(|s| mappers::api_scope_to_dto(&s)))
    }

    pub async fn get_api_scope(&self, id: SurrogateKey) -> AdminResult<ApiScopeDto> {
        let scope = self.load(id).await?;
        Ok(mappers::api_scope_to_dto(&scope))
    }

    pub async fn get_api_scope_names(&self, search: &str, limit: u32) -> AdminResult<Vec<String>> {
        Ok(self.ctx.store().get_api_scope_names(search, limit).await?)
    }

    pub async fn add_api_scope(&self, dto: &ApiScopeDto) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::ApiScopePropertyExistsValue,
        )?;
        let mut scope = mappers::api_scope_from_dto(dto);
        let id = self.insert(&scope).await?;
        scope.id = id;

        tracing::info!(id, name = %scope.name, actor = self.ctx.actor(), "api scope added");
        let record = self
            .ctx
            .record(AuditEntity::ApiScope, &scope.name)
            .with_after(&mappers::api_scope_to_dto(&scope));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_api_scope(&self, dto: &ApiScopeDto) -> AdminResult<()> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::ApiScopePropertyExistsValue,
        )?;
        let before = self.load(dto.id).await?;
        let mut scope = mappers::api_scope_from_dto(dto);
        mappers::adopt_api_scope_ids(&mut scope, &before);

        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        store
            .update_api_scope(&mut uow, &scope)
            .await
            .coded(ApiScopeDoesNotExist, ApiScopeExistsValue)?;
        uow.commit().await?;

        tracing::info!(id = scope.id, name = %scope.name, actor = self.ctx.actor(), "api scope updated");
        let record = self
            .ctx
            .record(AuditEntity::ApiScope, &scope.name)
            .with_before(&mappers::api_scope_to_dto(&before))
            .with_after(&mappers::api_scope_to_dto(&scope));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_api_scope(&self, id: SurrogateKey) -> AdminResult<()> {
        let before = self.load(id).await?;
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        store
            .delete_api_scope(&mut uow, id)
            .await
            .missing(ApiScopeDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id, name = %before.name, actor = self.ctx.actor(), "api scope deleted");
        let record = self
            .ctx
            .record(AuditEntity::ApiScope, &before.name)
            .with_before(&mappers::api_scope_to_dto(&before));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    pub async fn clone_api_scope(
        &self,
        source_id: SurrogateKey,
        name: &str,
    ) -> AdminResult<SurrogateKey> {
        let policy = self.ctx.clone_policy();
        self.clone_api_scope_with(source_id, name, &policy).await
    }

    pub async fn clone_api_scope_with(
        &self,
        source_id: SurrogateKey,
        name: &str,
        policy: &ClonePolicy<ApiScopeCollection>,
    ) -> AdminResult<SurrogateKey> {
        validate_key("name", name)?;
        let source = self.load(source_id).await?;
        let mut clone =
            clone_aggregate(&source, name.to_string(), policy, OffsetDateTime::now_utc());
        let id = self.insert(&clone).await?;
        clone.id = id;

        tracing::info!(source_id, id, name, actor = self.ctx.actor(), "api scope cloned");
        let record = self
            .ctx
            .record(AuditEntity::ApiScope, name)
            .with_before(&mappers::api_scope_to_dto(&source))
            .with_after(&mappers::api_scope_to_dto(&clone));
        self.ctx.emit(AuditEvent::Cloned(record)).await;
        Ok(id)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub async fn get_api_scope_properties(
        &self,
        scope_id: SurrogateKey,
        page: Page,
    ) -> AdminResult<PagedList<PropertyDto>> {
        self.scope_name(scope_id).await?;
        let properties = self
            .ctx
            .store()
            .get_api_scope_properties(scope_id, page)
            .await?;
        Ok(properties.map(|p| mappers::property_to_dto(&p)))
    }

    pub async fn get_api_scope_property(
        &self,
        property_id: SurrogateKey,
    ) -> AdminResult<OwnedDto<PropertyDto>> {
        let owned = self
            .ctx
            .store()
            .get_api_scope_property(property_id)
            .await
            .missing(ApiScopePropertyDoesNotExist)?;
        let parent_key = self.scope_name(owned.parent_id).await?;
        Ok(mappers::owned_to_dto(&owned, parent_key, mappers::property_to_dto))
    }

    pub async fn add_api_scope_property(
        &self,
        scope_id: SurrogateKey,
        dto: &PropertyDto,
    ) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        let parent_key = self.scope_name(scope_id).await?;
        let mut property = mappers::property_from_dto(dto);
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let id = store
            .add_api_scope_property(&mut uow, scope_id, &property)
            .await
            .coded(ApiScopeDoesNotExist, ApiScopePropertyExistsValue)?;
        uow.commit().await?;
        property.id = id;

        tracing::info!(id, api_scope = %parent_key, key = %property.key, actor = self.ctx.actor(), "api scope property added");
        let record = self
            .ctx
            .record(AuditEntity::ApiScopeProperty, id)
            .with_parent(parent_key)
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_api_scope_property(&self, dto: &PropertyDto) -> AdminResult<()> {
        dto.validate()?;
        let store = self.ctx.store();
        let before = store
            .get_api_scope_property(dto.id)
            .await
            .missing(ApiScopePropertyDoesNotExist)?;
        let parent_key = self.scope_name(before.parent_id).await?;
        let property = mappers::property_from_dto(dto);

        let mut uow = store.begin().await?;
        store
            .update_api_scope_property(&mut uow, &property)
            .await
            .coded(ApiScopePropertyDoesNotExist, ApiScopePropertyExistsValue)?;
        uow.commit().await?;

        tracing::info!(id = property.id, api_scope = %parent_key, actor = self.ctx.actor(), "api scope property updated");
        let record = self
            .ctx
            .record(AuditEntity::ApiScopeProperty, property.id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item))
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_api_scope_property(&self, property_id: SurrogateKey) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_api_scope_property(property_id)
            .await
            .missing(ApiScopePropertyDoesNotExist)?;
        let parent_key = self.scope_name(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_api_scope_property(&mut uow, property_id)
            .await
            .missing(ApiScopePropertyDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = property_id, api_scope = %parent_key, actor = self.ctx.actor(), "api scope property deleted");
        let record = self
            .ctx
            .record(AuditEntity::ApiScopeProperty, property_id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn insert(&self, scope: &ApiScope) -> AdminResult<SurrogateKey> {
        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        if !store.can_insert_api_scope(&mut uow, scope).await? {
            tracing::warn!(name = %scope.name, "api scope name already in use");
            return Err(AdminError::conflict(
                ApiScopeExistsValue,
                format!("api scope '{}'", scope.name),
            ));
        }
        let id = store
            .add_api_scope(&mut uow, scope)
            .await
            .coded(ApiScopeDoesNotExist, ApiScopeExistsValue)?;
        uow.commit().await?;
        Ok(id)
    }

    async fn load(&self, id: SurrogateKey) -> AdminResult<ApiScope> {
        self.ctx
            .store()
            .get_api_scope(id)
            .await?
            .ok_or_else(|| AdminError::not_found(ApiScopeDoesNotExist, format!("api scope {id}")))
    }

    async fn scope_name(&self, id: SurrogateKey) -> AdminResult<String> {
        self.ctx
            .store()
            .get_api_scope_name(id)
            .await?
            .ok_or_else(|| AdminError::not_found(ApiScopeDoesNotExist, format!("api scope {id}")))
    }
}
