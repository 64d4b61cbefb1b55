//! Client repository trait.

use crate::error::MetadataResult;
use crate::models::{Client, ClientClaim, ClientValueKind, Owned, Property, Secret, ValueRow};
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::{Page, PagedList, SurrogateKey};

/// Repository for client registrations and their child collections.
#[async_trait]
pub trait ClientRepo: Send + Sync {
    /// Page through clients whose client id or name matches `search`.
    /// Child collections are not loaded.
    async fn get_clients(&self, search: &str, page: Page) -> MetadataResult<PagedList<Client>>;

    /// Load a client with every child collection.
    async fn get_client(&self, id: SurrogateKey) -> MetadataResult<Option<Client>>;

    /// Client id (business key) for a surrogate key.
    async fn get_client_id(&self, id: SurrogateKey) -> MetadataResult<Option<String>>;

    /// Client ids matching `search`, at most `limit` of them (`0` = no limit).
    async fn get_client_ids(&self, search: &str, limit: u32) -> MetadataResult<Vec<String>>;

    /// True when no client other than `client` uses its client id.
    async fn can_insert_client(
        &self,
        uow: &mut UnitOfWork,
        client: &Client,
    ) -> MetadataResult<bool>;

    /// Insert a client and all of its children. Returns the new surrogate key.
    async fn add_client(&self, uow: &mut UnitOfWork, client: &Client)
    -> MetadataResult<SurrogateKey>;

    /// Replace scalar fields and reconcile every child collection.
    async fn update_client(&self, uow: &mut UnitOfWork, client: &Client) -> MetadataResult<()>;

    /// Delete a client; children are removed by cascade.
    async fn delete_client(&self, uow: &mut UnitOfWork, id: SurrogateKey) -> MetadataResult<()>;

    // Secrets

    async fn get_client_secrets(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Secret>>;

    async fn get_client_secret(&self, secret_id: SurrogateKey) -> MetadataResult<Owned<Secret>>;

    async fn add_client_secret(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        secret: &Secret,
    ) -> MetadataResult<SurrogateKey>;

    async fn delete_client_secret(
        &self,
        uow: &mut UnitOfWork,
        secret_id: SurrogateKey,
    ) -> MetadataResult<()>;

    // Claims

    async fn get_client_claims(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<ClientClaim>>;

    async fn get_client_claim(&self, claim_id: SurrogateKey)
    -> MetadataResult<Owned<ClientClaim>>;

    async fn add_client_claim(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        claim: &ClientClaim,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_client_claim(
        &self,
        uow: &mut UnitOfWork,
        claim: &ClientClaim,
    ) -> MetadataResult<()>;

    async fn delete_client_claim(
        &self,
        uow: &mut UnitOfWork,
        claim_id: SurrogateKey,
    ) -> MetadataResult<()>;

    // Properties

    async fn get_client_properties(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>>;

    async fn get_client_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>>;

    /// Fails with `AlreadyExists` if the client already has a property with
    /// the same key.
    async fn add_client_property(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey>;

    async fn update_client_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()>;

    async fn delete_client_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()>;

    // Single-value collections (redirect uris, cors origins, ...)

    async fn get_client_values(
        &self,
        client_id: SurrogateKey,
        kind: ClientValueKind,
    ) -> MetadataResult<Vec<ValueRow>>;

    async fn get_client_value(
        &self,
        kind: ClientValueKind,
        value_id: SurrogateKey,
    ) -> MetadataResult<Owned<ValueRow>>;

    async fn add_client_value(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        kind: ClientValueKind,
        value: &str,
    ) -> MetadataResult<SurrogateKey>;

    async fn delete_client_value(
        &self,
        uow: &mut UnitOfWork,
        kind: ClientValueKind,
        value_id: SurrogateKey,
    ) -> MetadataResult<()>;
}
