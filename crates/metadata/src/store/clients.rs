use super::SqliteStore;
use super::rows::{self, ChildTable, RootTable};
use crate::error::{MetadataError, MetadataResult};
use crate::models::{Client, ClientClaim, ClientValueKind, Owned, Property, Secret, ValueRow};
use crate::repos::ClientRepo;
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::{Aggregate, Page, PagedList, SurrogateKey, UNASSIGNED};
use sqlx::SqliteConnection;

const CLIENTS: RootTable = RootTable {
    table: "clients",
    key_column: "client_id",
    search_columns: &["client_id", "client_name"],
    label: Client::KIND,
};

const SECRETS: ChildTable = ChildTable {
    table: "client_secrets",
    label: "client secret",
};

const CLAIMS: ChildTable = ChildTable {
    table: "client_claims",
    label: "client claim",
};

const PROPERTIES: ChildTable = ChildTable {
    table: "client_properties",
    label: "client property",
};

fn value_table(kind: ClientValueKind) -> ChildTable {
    let (table, label) = match kind {
        ClientValueKind::RedirectUri => ("client_redirect_uris", "client redirect uri"),
        ClientValueKind::PostLogoutRedirectUri => (
            "client_post_logout_redirect_uris",
            "client post-logout redirect uri",
        ),
        ClientValueKind::AllowedScope => ("client_scopes", "client scope"),
        ClientValueKind::AllowedGrantType => ("client_grant_types", "client grant type"),
        ClientValueKind::AllowedCorsOrigin => ("client_cors_origins", "client cors origin"),
        ClientValueKind::IdentityProviderRestriction => {
            ("client_idp_restrictions", "client identity provider restriction")
        }
    };
    ChildTable { table, label }
}

async fn load_children(conn: &mut SqliteConnection, client: &mut Client) -> MetadataResult<()> {
    client.secrets = rows::list(conn, &SECRETS, client.id).await?;
    client.claims = rows::list(conn, &CLAIMS, client.id).await?;
    client.properties = rows::list(conn, &PROPERTIES, client.id).await?;
    for kind in ClientValueKind::ALL {
        *client.values_mut(kind) = rows::list(conn, &value_table(kind), client.id).await?;
    }
    Ok(())
}

#[async_trait]
impl ClientRepo for SqliteStore {
    async fn get_clients(&self, search: &str, page: Page) -> MetadataResult<PagedList<Client>> {
        let mut conn = self.conn().await?;
        rows::search_page(&mut conn, &CLIENTS, search, page).await
    }

    async fn get_client(&self, id: SurrogateKey) -> MetadataResult<Option<Client>> {
        let mut conn = self.conn().await?;
        let Some(mut client) = rows::fetch_root::<Client>(&mut conn, &CLIENTS, id).await? else {
            return Ok(None);
        };
        load_children(&mut conn, &mut client).await?;
        Ok(Some(client))
    }

    async fn get_client_id(&self, id: SurrogateKey) -> MetadataResult<Option<String>> {
        let mut conn = self.conn().await?;
        rows::business_key(&mut conn, &CLIENTS, id).await
    }

    async fn get_client_ids(&self, search: &str, limit: u32) -> MetadataResult<Vec<String>> {
        let mut conn = self.conn().await?;
        rows::key_listing(&mut conn, &CLIENTS, search, limit).await
    }

    async fn can_insert_client(
        &self,
        uow: &mut UnitOfWork,
        client: &Client,
    ) -> MetadataResult<bool> {
        let taken = rows::key_taken(uow.conn(), &CLIENTS, &client.client_id, client.id).await?;
        Ok(!taken)
    }

    async fn add_client(
        &self,
        uow: &mut UnitOfWork,
        client: &Client,
    ) -> MetadataResult<SurrogateKey> {
        if rows::key_taken(uow.conn(), &CLIENTS, &client.client_id, UNASSIGNED).await? {
            tracing::warn!(client_id = %client.client_id, "client id already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(client)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO clients (
                client_id, client_name, description, client_uri, logo_uri,
                protocol_type, enabled, require_client_secret, require_consent,
                require_pkce, allow_offline_access, access_token_lifetime,
                identity_token_lifetime, absolute_refresh_token_lifetime,
                non_editable, created, updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client.client_id)
        .bind(&client.client_name)
        .bind(&client.description)
        .bind(&client.client_uri)
        .bind(&client.logo_uri)
        .bind(&client.protocol_type)
        .bind(client.enabled)
        .bind(client.require_client_secret)
        .bind(client.require_consent)
        .bind(client.require_pkce)
        .bind(client.allow_offline_access)
        .bind(client.access_token_lifetime)
        .bind(client.identity_token_lifetime)
        .bind(client.absolute_refresh_token_lifetime)
        .bind(client.non_editable)
        .bind(client.created)
        .bind(client.updated)
        .execute(uow.conn())
        .await
        .map_err(|e| MetadataError::from_insert(e, || rows::key_detail(client)))?;

        let id = result.last_insert_rowid();
        let mut written = 1;
        let conn = uow.conn();
        written += rows::insert_all(conn, &SECRETS, id, &client.secrets).await?;
        written += rows::insert_all(conn, &CLAIMS, id, &client.claims).await?;
        written += rows::insert_all(conn, &PROPERTIES, id, &client.properties).await?;
        for kind in ClientValueKind::ALL {
            written += rows::insert_all(conn, &value_table(kind), id, client.values(kind)).await?;
        }
        uow.record(written);

        tracing::info!(id, client_id = %client.client_id, rows = written, "client added");
        Ok(id)
    }

    async fn update_client(&self, uow: &mut UnitOfWork, client: &Client) -> MetadataResult<()> {
        rows::require_stored(uow.conn(), &CLIENTS, client).await?;
        if rows::key_taken(uow.conn(), &CLIENTS, &client.client_id, client.id).await? {
            tracing::warn!(id = client.id, client_id = %client.client_id, "client id already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(client)));
        }

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                client_id = ?, client_name = ?, description = ?, client_uri = ?,
                logo_uri = ?, protocol_type = ?, enabled = ?, require_client_secret = ?,
                require_consent = ?, require_pkce = ?, allow_offline_access = ?,
                access_token_lifetime = ?, identity_token_lifetime = ?,
                absolute_refresh_token_lifetime = ?, non_editable = ?, updated = ?
            WHERE id = ?
            "#,
        )
        .bind(&client.client_id)
        .bind(&client.client_name)
        .bind(&client.description)
        .bind(&client.client_uri)
        .bind(&client.logo_uri)
        .bind(&client.protocol_type)
        .bind(client.enabled)
        .bind(client.require_client_secret)
        .bind(client.require_consent)
        .bind(client.require_pkce)
        .bind(client.allow_offline_access)
        .bind(client.access_token_lifetime)
        .bind(client.identity_token_lifetime)
        .bind(client.absolute_refresh_token_lifetime)
        .bind(client.non_editable)
        .bind(client.updated)
        .bind(client.id)
        .execute(uow.conn())
        .await
        .map_err(|e| MetadataError::from_insert(e, || rows::key_detail(client)))?;

        let mut written = result.rows_affected();
        let conn = uow.conn();
        written += rows::reconcile(conn, &SECRETS, client.id, &client.secrets).await?;
        written += rows::reconcile(conn, &CLAIMS, client.id, &client.claims).await?;
        written += rows::reconcile(conn, &PROPERTIES, client.id, &client.properties).await?;
        for kind in ClientValueKind::ALL {
            written +=
                rows::reconcile(conn, &value_table(kind), client.id, client.values(kind)).await?;
        }
        uow.record(written);

        tracing::info!(id = client.id, client_id = %client.client_id, rows = written, "client updated");
        Ok(())
    }

    async fn delete_client(&self, uow: &mut UnitOfWork, id: SurrogateKey) -> MetadataResult<()> {
        let removed = rows::delete_root(uow.conn(), &CLIENTS, id).await?;
        uow.record(removed);
        tracing::info!(id, "client deleted");
        Ok(())
    }

    async fn get_client_secrets(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Secret>> {
        let mut conn = self.conn().await?;
        rows::page(&mut conn, &SECRETS, client_id, page).await
    }

    async fn get_client_secret(&self, secret_id: SurrogateKey) -> MetadataResult<Owned<Secret>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &SECRETS, secret_id).await
    }

    async fn add_client_secret(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        secret: &Secret,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &CLIENTS, client_id).await?;
        let id = rows::insert(uow.conn(), &SECRETS, client_id, secret).await?;
        uow.record(1);
        tracing::info!(id, client_id, secret_type = %secret.secret_type, "client secret added");
        Ok(id)
    }

    async fn delete_client_secret(
        &self,
        uow: &mut UnitOfWork,
        secret_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &SECRETS, secret_id).await?;
        uow.record(removed);
        tracing::info!(id = secret_id, "client secret deleted");
        Ok(())
    }

    async fn get_client_claims(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<ClientClaim>> {
        let mut conn = self.conn().await?;
        rows::page(&mut conn, &CLAIMS, client_id, page).await
    }

    async fn get_client_claim(
        &self,
        claim_id: SurrogateKey,
    ) -> MetadataResult<Owned<ClientClaim>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &CLAIMS, claim_id).await
    }

    async fn add_client_claim(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        claim: &ClientClaim,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &CLIENTS, client_id).await?;
        let id = rows::insert(uow.conn(), &CLAIMS, client_id, claim).await?;
        uow.record(1);
        tracing::info!(id, client_id, claim_type = %claim.claim_type, "client claim added");
        Ok(id)
    }

    async fn update_client_claim(
        &self,
        uow: &mut UnitOfWork,
        claim: &ClientClaim,
    ) -> MetadataResult<()> {
        let written = rows::update(uow.conn(), &CLAIMS, claim).await?;
        uow.record(written);
        tracing::info!(id = claim.id, "client claim updated");
        Ok(())
    }

    async fn delete_client_claim(
        &self,
        uow: &mut UnitOfWork,
        claim_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &CLAIMS, claim_id).await?;
        uow.record(removed);
        tracing::info!(id = claim_id, "client claim deleted");
        Ok(())
    }

    async fn get_client_properties(
        &self,
        client_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>> {
        let mut conn = self.conn().await?;
        rows::page(&mut conn, &PROPERTIES, client_id, page).await
    }

    async fn get_client_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &PROPERTIES, property_id).await
    }

    async fn add_client_property(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &CLIENTS, client_id).await?;
        let id = rows::insert(uow.conn(), &PROPERTIES, client_id, property).await?;
        uow.record(1);
        tracing::info!(id, client_id, key = %property.key, "client property added");
        Ok(id)
    }

    async fn update_client_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()> {
        let written = rows::update(uow.conn(), &PROPERTIES, property).await?;
        uow.record(written);
        tracing::info!(id = property.id, key = %property.key, "client property updated");
        Ok(())
    }

    async fn delete_client_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &PROPERTIES, property_id).await?;
        uow.record(removed);
        tracing::info!(id = property_id, "client property deleted");
        Ok(())
    }

    async fn get_client_values(
        &self,
        client_id: SurrogateKey,
        kind: ClientValueKind,
    ) -> MetadataResult<Vec<ValueRow>> {
        let mut conn = self.conn().await?;
        rows::list(&mut conn, &value_table(kind), client_id).await
    }

    async fn get_client_value(
        &self,
        kind: ClientValueKind,
        value_id: SurrogateKey,
    ) -> MetadataResult<Owned<ValueRow>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &value_table(kind), value_id).await
    }

    async fn add_client_value(
        &self,
        uow: &mut UnitOfWork,
        client_id: SurrogateKey,
        kind: ClientValueKind,
        value: &str,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &CLIENTS, client_id).await?;
        let row = ValueRow::new(value);
        let id = rows::insert(uow.conn(), &value_table(kind), client_id, &row).await?;
        uow.record(1);
        tracing::info!(id, client_id, kind = %kind, value, "client value added");
        Ok(id)
    }

    async fn delete_client_value(
        &self,
        uow: &mut UnitOfWork,
        kind: ClientValueKind,
        value_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &value_table(kind), value_id).await?;
        uow.record(removed);
        tracing::info!(id = value_id, kind = %kind, "client value deleted");
        Ok(())
    }
}
