//! Client administration.

use crate::audit::{AuditEntity, AuditEvent};
use crate::clone::{ClientCollection, ClonePolicy, clone_aggregate};
use crate::context::AdminContext;
use crate::dtos::{ClientClaimDto, ClientDto, OwnedDto, PropertyDto, SecretDto, ValueDto};
use crate::error::{AdminError, AdminResult, Coded, ResourceCode};
use crate::mappers;
use gatehouse_core::aggregate::validate_key;
use gatehouse_core::{Page, PagedList, SurrogateKey};
use gatehouse_metadata::models::{Client, ClientValueKind};
use gatehouse_metadata::repos::ClientRepo;
use serde_json::json;
use time::OffsetDateTime;

use ResourceCode::{ClientDoesNotExist, ClientExistsValue};

pub struct ClientService {
    ctx: AdminContext,
}

impl ClientService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AdminContext {
        &self.ctx
    }

    // =========================================================================
    // Clients
    // =========================================================================

    pub async fn get_clients(&self, search: &str, page: Page) -> AdminResult<PagedList<ClientDto>> {
        let clients = self.ctx.store().get_clients(search, page).await?;
        tracing::debug!(search, total = clients.total_count, "listed clients");
        Ok(clients.map(|c| mappers::client_to_dto(&c)))
    }

    pub async fn get_client(&self, id: SurrogateKey) -> AdminResult<ClientDto> {
        let client = self.load(id).await?;
        Ok(mappers::client_to_dto(&client))
    }

    /// Client identifiers matching `search`; a `limit` of 0 returns all.
    pub async fn get_client_ids(&self, search: &str, limit: u32) -> AdminResult<Vec<String>> {
        Ok(self.ctx.store().get_client_ids(search, limit).await?)
    }

    /// Whether the client id of `dto` is free (or already owned by `dto.id`).
    pub async fn can_insert_client(&self, dto: &ClientDto) -> AdminResult<bool> {
        validate_key("client_id", &dto.client_id)?;
        let client = mappers::client_from_dto(dto, OffsetDateTime::now_utc());
        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        let free = store.can_insert_client(&mut uow, &client).await?;
        uow.rollback().await?;
        Ok(free)
    }

    pub async fn add_client(&self, dto: &ClientDto) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::ClientPropertyExistsValue,
        )?;
        let mut client = mappers::client_from_dto(dto, OffsetDateTime::now_utc());
        mappers::require_secret_values(&client.secrets)?;
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        if !store.can_insert_client(&mut uow, &client).await? {
            tracing::warn!(client_id = %client.client_id, "client id already in use");
            return Err(AdminError::conflict(
                ClientExistsValue,
                format!("client '{}'", client.client_id),
            ));
        }
        let id = store
            .add_client(&mut uow, &client)
            .await
            .coded(ClientDoesNotExist, ClientExistsValue)?;
        uow.commit().await?;
        client.id = id;

        tracing::info!(id, client_id = %client.client_id, actor = self.ctx.actor(), "client added");
        let record = self
            .ctx
            .record(AuditEntity::Client, &client.client_id)
            .with_after(&mappers::client_to_dto(&client));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_client(&self, dto: &ClientDto) -> AdminResult<()> {
        dto.validate()?;
        super::ensure_unique_property_keys(
            &dto.properties,
            ResourceCode::ClientPropertyExistsValue,
        )?;
        let before = self.load(dto.id).await?;

        let now = OffsetDateTime::now_utc();
        let mut client = mappers::client_from_dto(dto, now);
        client.created = before.created;
        client.updated = Some(now);
        mappers::adopt_client_ids(&mut client, &before);
        mappers::require_secret_values(&client.secrets)?;

        let store = self.ctx.store();
        let mut uow = store.begin().await?;
        store
            .update_client(&mut uow, &client)
            .await
            .coded(ClientDoesNotExist, ClientExistsValue)?;
        uow.commit().await?;

        tracing::info!(id = client.id, client_id = %client.client_id, actor = self.ctx.actor(), "client updated");
        let record = self
            .ctx
            .record(AuditEntity::Client, &client.client_id)
            .with_before(&mappers::client_to_dto(&before))
            .with_after(&mappers::client_to_dto(&client));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_client(&self, id: SurrogateKey) -> AdminResult<()> {
        let before = self.load(id).await?;
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        store
            .delete_client(&mut uow, id)
            .await
            .missing(ClientDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id, client_id = %before.client_id, actor = self.ctx.actor(), "client deleted");
        let record = self
            .ctx
            .record(AuditEntity::Client, &before.client_id)
            .with_before(&mappers::client_to_dto(&before));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    /// Copy client `source_id` under a new client id, using the configured
    /// default policy.
    pub async fn clone_client(
        &self,
        source_id: SurrogateKey,
        client_id: &str,
    ) -> AdminResult<SurrogateKey> {
        let policy = self.ctx.clone_policy();
        self.clone_client_with(source_id, client_id, &policy).await
    }

    pub async fn clone_client_with(
        &self,
        source_id: SurrogateKey,
        client_id: &str,
        policy: &ClonePolicy<ClientCollection>,
    ) -> AdminResult<SurrogateKey> {
        validate_key("client_id", client_id)?;
        let source = self.load(source_id).await?;
        let mut clone = clone_aggregate(
            &source,
            client_id.to_string(),
            policy,
            OffsetDateTime::now_utc(),
        );
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        if !store.can_insert_client(&mut uow, &clone).await? {
            tracing::warn!(source_id, client_id, "clone target client id already in use");
            return Err(AdminError::conflict(
                ClientExistsValue,
                format!("client '{client_id}'"),
            ));
        }
        let id = store
            .add_client(&mut uow, &clone)
            .await
            .coded(ClientDoesNotExist, ClientExistsValue)?;
        uow.commit().await?;
        clone.id = id;

        tracing::info!(
            source_id,
            id,
            client_id,
            excluded = ?policy.excluded(),
            actor = self.ctx.actor(),
            "client cloned"
        );
        let record = self
            .ctx
            .record(AuditEntity::Client, client_id)
            .with_before(&mappers::client_to_dto(&source))
            .with_after(&mappers::client_to_dto(&clone));
        self.ctx.emit(AuditEvent::Cloned(record)).await;
        Ok(id)
    }

    // =========================================================================
    // Secrets
    // =========================================================================

    pub async fn get_client_secrets(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> AdminResult<PagedList<SecretDto>> {
        self.client_key(client_id).await?;
        let secrets = self.ctx.store().get_client_secrets(client_id, page).await?;
        Ok(secrets.map(|s| mappers::secret_to_dto(&s)))
    }

    pub async fn get_client_secret(
        &self,
        secret_id: SurrogateKey,
    ) -> AdminResult<OwnedDto<SecretDto>> {
        let owned = self
            .ctx
            .store()
            .get_client_secret(secret_id)
            .await
            .missing(ResourceCode::ClientSecretDoesNotExist)?;
        let parent_key = self.client_key(owned.parent_id).await?;
        Ok(mappers::owned_to_dto(&owned, parent_key, mappers::secret_to_dto))
    }

    pub async fn add_client_secret(
        &self,
        client_id: SurrogateKey,
        dto: &SecretDto,
    ) -> AdminResult<SurrogateKey> {
        dto.validate_new()?;
        let parent_key = self.client_key(client_id).await?;
        let mut secret = mappers::secret_from_dto(dto, OffsetDateTime::now_utc());
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let id = store
            .add_client_secret(&mut uow, client_id, &secret)
            .await
            .missing(ClientDoesNotExist)?;
        uow.commit().await?;
        secret.id = id;

        tracing::info!(id, client_id = %parent_key, actor = self.ctx.actor(), "client secret added");
        let record = self
            .ctx
            .record(AuditEntity::ClientSecret, id)
            .with_parent(parent_key)
            .with_after(&mappers::secret_to_dto(&secret));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn delete_client_secret(&self, secret_id: SurrogateKey) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_client_secret(secret_id)
            .await
            .missing(ResourceCode::ClientSecretDoesNotExist)?;
        let parent_key = self.client_key(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_client_secret(&mut uow, secret_id)
            .await
            .missing(ResourceCode::ClientSecretDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = secret_id, client_id = %parent_key, actor = self.ctx.actor(), "client secret deleted");
        let record = self
            .ctx
            .record(AuditEntity::ClientSecret, secret_id)
            .with_parent(parent_key)
            .with_before(&mappers::secret_to_dto(&before.item));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Claims
    // =========================================================================

    pub async fn get_client_claims(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> AdminResult<PagedList<ClientClaimDto>> {
        self.client_key(client_id).await?;
        let claims = self.ctx.store().get_client_claims(client_id, page).await?;
        Ok(claims.map(|c| mappers::client_claim_to_dto(&c)))
    }

    pub async fn get_client_claim(
        &self,
        claim_id: SurrogateKey,
    ) -> AdminResult<OwnedDto<ClientClaimDto>> {
        let owned = self
            .ctx
            .store()
            .get_client_claim(claim_id)
            .await
            .missing(ResourceCode::ClientClaimDoesNotExist)?;
        let parent_key = self.client_key(owned.parent_id).await?;
        Ok(mappers::owned_to_dto(
            &owned,
            parent_key,
            mappers::client_claim_to_dto,
        ))
    }

    pub async fn add_client_claim(
        &self,
        client_id: SurrogateKey,
        dto: &ClientClaimDto,
    ) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        let parent_key = self.client_key(client_id).await?;
        let mut claim = mappers::client_claim_from_dto(dto);
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let id = store
            .add_client_claim(&mut uow, client_id, &claim)
            .await
            .missing(ClientDoesNotExist)?;
        uow.commit().await?;
        claim.id = id;

        tracing::info!(id, client_id = %parent_key, claim_type = %claim.claim_type, actor = self.ctx.actor(), "client claim added");
        let record = self
            .ctx
            .record(AuditEntity::ClientClaim, id)
            .with_parent(parent_key)
            .with_after(&mappers::client_claim_to_dto(&claim));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_client_claim(&self, dto: &ClientClaimDto) -> AdminResult<()> {
        dto.validate()?;
        let store = self.ctx.store();
        let before = store
            .get_client_claim(dto.id)
            .await
            .missing(ResourceCode::ClientClaimDoesNotExist)?;
        let parent_key = self.client_key(before.parent_id).await?;
        let claim = mappers::client_claim_from_dto(dto);

        let mut uow = store.begin().await?;
        store
            .update_client_claim(&mut uow, &claim)
            .await
            .missing(ResourceCode::ClientClaimDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = claim.id, client_id = %parent_key, actor = self.ctx.actor(), "client claim updated");
        let record = self
            .ctx
            .record(AuditEntity::ClientClaim, claim.id)
            .with_parent(parent_key)
            .with_before(&mappers::client_claim_to_dto(&before.item))
            .with_after(&mappers::client_claim_to_dto(&claim));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_client_claim(&self, claim_id: SurrogateKey) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_client_claim(claim_id)
            .await
            .missing(ResourceCode::ClientClaimDoesNotExist)?;
        let parent_key = self.client_key(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_client_claim(&mut uow, claim_id)
            .await
            .missing(ResourceCode::ClientClaimDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = claim_id, client_id = %parent_key, actor = self.ctx.actor(), "client claim deleted");
        let record = self
            .ctx
            .record(AuditEntity::ClientClaim, claim_id)
            .with_parent(parent_key)
            .with_before(&mappers::client_claim_to_dto(&before.item));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    pub async fn get_client_properties(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> AdminResult<PagedList<PropertyDto>> {
        self.client_key(client_id).await?;
        let properties = self
            .ctx
            .store()
            .get_client_properties(client_id, page)
            .await?;
        Ok(properties.map(|p| mappers::property_to_dto(&p)))
    }

    pub async fn get_client_property(
        &self,
        property_id: SurrogateKey,
    ) -> AdminResult<OwnedDto<PropertyDto>> {
        let owned = self
            .ctx
            .store()
            .get_client_property(property_id)
            .await
            .missing(ResourceCode::ClientPropertyDoesNotExist)?;
        let parent_key = self.client_key(owned.parent_id).await?;
        Ok(mappers::owned_to_dto(&owned, parent_key, mappers::property_to_dto))
    }

    pub async fn add_client_property(
        &self,
        client_id: SurrogateKey,
        dto: &PropertyDto,
    ) -> AdminResult<SurrogateKey> {
        dto.validate()?;
        let parent_key = self.client_key(client_id).await?;
        let mut property = mappers::property_from_dto(dto);
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let id = store
            .add_client_property(&mut uow, client_id, &property)
            .await
            .coded(ClientDoesNotExist, ResourceCode::ClientPropertyExistsValue)?;
        uow.commit().await?;
        property.id = id;

        tracing::info!(id, client_id = %parent_key, key = %property.key, actor = self.ctx.actor(), "client property added");
        let record = self
            .ctx
            .record(AuditEntity::ClientProperty, id)
            .with_parent(parent_key)
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn update_client_property(&self, dto: &PropertyDto) -> AdminResult<()> {
        dto.validate()?;
        let store = self.ctx.store();
        let before = store
            .get_client_property(dto.id)
            .await
            .missing(ResourceCode::ClientPropertyDoesNotExist)?;
        let parent_key = self.client_key(before.parent_id).await?;
        let property = mappers::property_from_dto(dto);

        let mut uow = store.begin().await?;
        store
            .update_client_property(&mut uow, &property)
            .await
            .coded(
                ResourceCode::ClientPropertyDoesNotExist,
                ResourceCode::ClientPropertyExistsValue,
            )?;
        uow.commit().await?;

        tracing::info!(id = property.id, client_id = %parent_key, actor = self.ctx.actor(), "client property updated");
        let record = self
            .ctx
            .record(AuditEntity::ClientProperty, property.id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item))
            .with_after(&mappers::property_to_dto(&property));
        self.ctx.emit(AuditEvent::Updated(record)).await;
        Ok(())
    }

    pub async fn delete_client_property(&self, property_id: SurrogateKey) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_client_property(property_id)
            .await
            .missing(ResourceCode::ClientPropertyDoesNotExist)?;
        let parent_key = self.client_key(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_client_property(&mut uow, property_id)
            .await
            .missing(ResourceCode::ClientPropertyDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = property_id, client_id = %parent_key, actor = self.ctx.actor(), "client property deleted");
        let record = self
            .ctx
            .record(AuditEntity::ClientProperty, property_id)
            .with_parent(parent_key)
            .with_before(&mappers::property_to_dto(&before.item));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Redirect uris, cors origins, scopes, grant types, ...
    // =========================================================================

    pub async fn get_client_values(
        &self,
        client_id: SurrogateKey,
        kind: ClientValueKind,
    ) -> AdminResult<Vec<ValueDto>> {
        self.client_key(client_id).await?;
        let values = self.ctx.store().get_client_values(client_id, kind).await?;
        Ok(values.iter().map(mappers::value_to_dto).collect())
    }

    pub async fn add_client_value(
        &self,
        client_id: SurrogateKey,
        kind: ClientValueKind,
        value: &str,
    ) -> AdminResult<SurrogateKey> {
        validate_key(kind.as_str(), value)?;
        let parent_key = self.client_key(client_id).await?;
        let store = self.ctx.store();

        let mut uow = store.begin().await?;
        let id = store
            .add_client_value(&mut uow, client_id, kind, value)
            .await
            .missing(ClientDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id, client_id = %parent_key, %kind, value, actor = self.ctx.actor(), "client value added");
        let record = self
            .ctx
            .record(AuditEntity::ClientValue, id)
            .with_parent(parent_key)
            .with_after(&json!({ "kind": kind.as_str(), "id": id, "value": value }));
        self.ctx.emit(AuditEvent::Created(record)).await;
        Ok(id)
    }

    pub async fn delete_client_value(
        &self,
        kind: ClientValueKind,
        value_id: SurrogateKey,
    ) -> AdminResult<()> {
        let store = self.ctx.store();
        let before = store
            .get_client_value(kind, value_id)
            .await
            .missing(ResourceCode::ClientValueDoesNotExist)?;
        let parent_key = self.client_key(before.parent_id).await?;

        let mut uow = store.begin().await?;
        store
            .delete_client_value(&mut uow, kind, value_id)
            .await
            .missing(ResourceCode::ClientValueDoesNotExist)?;
        uow.commit().await?;

        tracing::info!(id = value_id, client_id = %parent_key, %kind, actor = self.ctx.actor(), "client value deleted");
        let record = self
            .ctx
            .record(AuditEntity::ClientValue, value_id)
            .with_parent(parent_key)
            .with_before(&json!({
                "kind": kind.as_str(),
                "id": value_id,
                "value": before.item.value,
            }));
        self.ctx.emit(AuditEvent::Deleted(record)).await;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load(&self, id: SurrogateKey) -> AdminResult<Client> {
        self.ctx
            .store()
            .get_client(id)
            .await?
            .ok_or_else(|| AdminError::not_found(ClientDoesNotExist, format!("client {id}")))
    }

    async fn client_key(&self, id: SurrogateKey) -> AdminResult<String> {
        self.ctx
            .store()
            .get_client_id(id)
            .await?
            .ok_or_else(|| AdminError::not_found(ClientDoesNotExist, format!("client {id}")))
    }
}
