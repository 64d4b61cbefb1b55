use super::SqliteStore;
use super::rows::{self, ChildTable, RootTable};
use crate::error::{MetadataError, MetadataResult};
use crate::models::{ApiResource, ApiScope, IdentityResource, Owned, Property, Secret};
use crate::repos::{ApiResourceRepo, ApiScopeRepo, IdentityResourceRepo};
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use gatehouse_core::{Aggregate, Page, PagedList, SurrogateKey, UNASSIGNED};

// =============================================================================
// API resources
// =============================================================================

const API_RESOURCES: RootTable = RootTable {
    table: "api_resources",
    key_column: "name",
    search_columns: &["name"],
    label: ApiResource::KIND,
};

const API_RESOURCE_SECRETS: ChildTable = ChildTable {
    table: "api_resource_secrets",
    label: "api resource secret",
};

const API_RESOURCE_PROPERTIES: ChildTable = ChildTable {
    table: "api_resource_properties",
    label: "api resource property",
};

const API_RESOURCE_CLAIMS: ChildTable = ChildTable {
    table: "api_resource_claims",
    label: "api resource claim",
};

const API_RESOURCE_SCOPES: ChildTable = ChildTable {
    table: "api_resource_scopes",
    label: "api resource scope",
};

#[async_trait]
impl ApiResourceRepo for SqliteStore {
    async fn get_api_resources(
        &self,
        search: &str,
        page: Page,
    ) -> MetadataResult<PagedList<ApiResource>> {
        let mut conn = self.conn().await?;
        rows::search_page(&mut conn, &API_RESOURCES, search, page).await
    }

    async fn get_api_resource(&self, id: SurrogateKey) -> MetadataResult<Option<ApiResource>> {
        let mut conn = self.conn().await?;
        let Some(mut resource) =
            rows::fetch_root::<ApiResource>(&mut conn, &API_RESOURCES, id).await?
        else {
            return Ok(None);
        };
        resource.secrets = rows::list(&mut conn, &API_RESOURCE_SECRETS, id).await?;
        resource.properties = rows::list(&mut conn, &API_RESOURCE_PROPERTIES, id).await?;
        resource.user_claims = rows::list(&mut conn, &API_RESOURCE_CLAIMS, id).await?;
        resource.scopes = rows::list(&mut conn, &API_RESOURCE_SCOPES, id).await?;
        Ok(Some(resource))
    }

    async fn get_api_resource_name(&self, id: SurrogateKey) -> MetadataResult<Option<String>> {
        let mut conn = self.conn().await?;
        rows::business_key(&mut conn, &API_RESOURCES, id).await
    }

    async fn get_api_resource_names(
        &self,
        search: &str,
        limit: u32,
    ) -> MetadataResult<Vec<String>> {
        let mut conn = self.conn().await?;
        rows::key_listing(&mut conn, &API_RESOURCES, search, limit).await
    }

    async fn can_insert_api_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &ApiResource,
    ) -> MetadataResult<bool> {
        let taken = rows::key_taken(uow.conn(), &API_RESOURCES, &resource.name, resource.id).await?;
        Ok(!taken)
    }

    async fn add_api_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &ApiResource,
    ) -> MetadataResult<SurrogateKey> {
        if rows::key_taken(uow.conn(), &API_RESOURCES, &resource.name, UNASSIGNED).await? {
            tracing::warn!(name = %resource.name, "api resource name already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(resource)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO api_resources (
                name, display_name, description, enabled, show_in_discovery_document,
                require_resource_indicator, non_editable, created, updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&resource.name)
        .bind(&resource.display_name)
        .bind(&resource.description)
        .bind(resource.enabled)
        .bind(resource.show_in_discovery_document)
        .bind(resource.require_resource_indicator)
        .bind(resource.non_editable)
        .bind(resource.created)
        .bind(resource.updated)
        .execute(uow.conn())
        .await
        .map_err(|e| MetadataError::from_insert(e, || rows::key_detail(resource)))?;

        let id = result.last_insert_rowid();
        let mut written = 1;
        let conn = uow.conn();
        written += rows::insert_all(conn, &API_RESOURCE_SECRETS, id, &resource.secrets).await?;
        written +=
            rows::insert_all(conn, &API_RESOURCE_PROPERTIES, id, &resource.properties).await?;
        written += rows::insert_all(conn, &API_RESOURCE_CLAIMS, id, &resource.user_claims).await?;
        written += rows::insert_all(conn, &API_RESOURCE_SCOPES, id, &resource.scopes).await?;
        uow.record(written);

        tracing::info!(id, name = %resource.name, rows = written, "api resource added");
        Ok(id)
    }

    async fn update_api_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &ApiResource,
    ) -> MetadataResult<()> {
        rows::require_stored(uow.conn(), &API_RESOURCES, resource).await?;
        if rows::key_taken(uow.conn(), &API_RESOURCES, &resource.name, resource.id).await? {
            tracing::warn!(id = resource.id, name = %resource.name, "api resource name already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(resource)));
        }

        let result = sqlx::query(
            r#"
            UPDATE api_resources SET
                name = ?, display_name = ?, description = ?, enabled = ?,
                show_in_discovery_document = ?, require_resource_indicator = ?,
                non_editable = ?, updated = ?
            WHERE id = ?
            "#,
        )
        .bind(&resource.name)
        .bind(&resource.display_name)
        .bind(&resource.description)
        .bind(resource.enabled)
        .bind(resource.show_in_discovery_document)
        .bind(resource.require_resource_indicator)
        .bind(resource.non_editable)
        .bind(resource.updated)
        .bind(resource.id)
        .execute(uow.conn())
        .await
        .map_err(|e| MetadataError::from_insert(e, || rows::key_detail(resource)))?;

        let id = resource.id;
        let mut written = result.rows_affected();
        let conn = uow.conn();
        written += rows::reconcile(conn, &API_RESOURCE_SECRETS, id, &resource.secrets).await?;
        written +=
            rows::reconcile(conn, &API_RESOURCE_PROPERTIES, id, &resource.properties).await?;
        written += rows::reconcile(conn, &API_RESOURCE_CLAIMS, id, &resource.user_claims).await?;
        written += rows::reconcile(conn, &API_RESOURCE_SCOPES, id, &resource.scopes).await?;
        uow.record(written);

        tracing::info!(id, name = %resource.name, rows = written, "api resource updated");
        Ok(())
    }

    async fn delete_api_resource(
        &self,
        uow: &mut UnitOfWork,
        id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete_root(uow.conn(), &API_RESOURCES, id).await?;
        uow.record(removed);
        tracing::info!(id, "api resource deleted");
        Ok(())
    }

    async fn get_api_resource_secrets(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Secret>> {
        let mut conn = self.conn().await?;
        rows::page(&mut conn, &API_RESOURCE_SECRETS, resource_id, page).await
    }

    async fn get_api_resource_secret(
        &self,
        secret_id: SurrogateKey,
    ) -> MetadataResult<Owned<Secret>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &API_RESOURCE_SECRETS, secret_id).await
    }

    async fn add_api_resource_secret(
        &self,
        uow: &mut UnitOfWork,
        resource_id: SurrogateKey,
        secret: &Secret,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &API_RESOURCES, resource_id).await?;
        let id = rows::insert(uow.conn(), &API_RESOURCE_SECRETS, resource_id, secret).await?;
        uow.record(1);
        tracing::info!(id, resource_id, "api resource secret added");
        Ok(id)
    }

    async fn delete_api_resource_secret(
        &self,
        uow: &mut UnitOfWork,
        secret_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &API_RESOURCE_SECRETS, secret_id).await?;
        uow.record(removed);
        tracing::info!(id = secret_id, "api resource secret deleted");
        Ok(())
    }

    async fn get_api_resource_properties(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>> {
        let mut conn = self.conn().await?;
        rows::page(&mut conn, &API_RESOURCE_PROPERTIES, resource_id, page).await
    }

    async fn get_api_resource_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &API_RESOURCE_PROPERTIES, property_id).await
    }

    async fn add_api_resource_property(
        &self,
        uow: &mut UnitOfWork,
        resource_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &API_RESOURCES, resource_id).await?;
        let id = rows::insert(uow.conn(), &API_RESOURCE_PROPERTIES, resource_id, property).await?;
        uow.record(1);
        tracing::info!(id, resource_id, key = %property.key, "api resource property added");
        Ok(id)
    }

    async fn update_api_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()> {
        let written = rows::update(uow.conn(), &API_RESOURCE_PROPERTIES, property).await?;
        uow.record(written);
        tracing::info!(id = property.id, key = %property.key, "api resource property updated");
        Ok(())
    }

    async fn delete_api_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &API_RESOURCE_PROPERTIES, property_id).await?;
        uow.record(removed);
        tracing::info!(id = property_id, "api resource property deleted");
        Ok(())
    }
}

// =============================================================================
// API scopes
// =============================================================================

const API_SCOPES: RootTable = RootTable {
    table: "api_scopes",
    key_column: "name",
    search_columns: &["name"],
    label: ApiScope::KIND,
};

const API_SCOPE_PROPERTIES: ChildTable = ChildTable {
    table: "api_scope_properties",
    label: "api scope property",
};

const API_SCOPE_CLAIMS: ChildTable = ChildTable {
    table: "api_scope_claims",
    label: "api scope claim",
};

#[async_trait]
impl ApiScopeRepo for SqliteStore {
    async fn get_api_scopes(
        &self,
        search: &str,
        page: Page,
    ) -> MetadataResult<PagedList<ApiScope>> {
        let mut conn = self.conn().await?;
        rows::search_page(&mut conn, &API_SCOPES, search, page).await
    }

    async fn get_api_scope(&self, id: SurrogateKey) -> MetadataResult<Option<ApiScope>> {
        let mut conn = self.conn().await?;
        let Some(mut scope) = rows::fetch_root::<ApiScope>(&mut conn, &API_SCOPES, id).await?
        else {
            return Ok(None);
        };
        scope.properties = rows::list(&mut conn, &API_SCOPE_PROPERTIES, id).await?;
        scope.user_claims = rows::list(&mut conn, &API_SCOPE_CLAIMS, id).await?;
        Ok(Some(scope))
    }

    async fn get_api_scope_name(&self, id: SurrogateKey) -> MetadataResult<Option<String>> {
        let mut conn = self.conn().await?;
        rows::business_key(&mut conn, &API_SCOPES, id).await
    }

    async fn get_api_scope_names(&self, search: &str, limit: u32) -> MetadataResult<Vec<String>> {
        let mut conn = self.conn().await?;
        rows::key_listing(&mut conn, &API_SCOPES, search, limit).await
    }

    async fn can_insert_api_scope(
        &self,
        uow: &mut UnitOfWork,
        scope: &ApiScope,
    ) -> MetadataResult<bool> {
        let taken = rows::key_taken(uow.conn(), &API_SCOPES, &scope.name, scope.id).await?;
        Ok(!taken)
    }

    async fn add_api_scope(
        &self,
        uow: &mut UnitOfWork,
        scope: &ApiScope,
    ) -> MetadataResult<SurrogateKey> {
        if rows::key_taken(uow.conn(), &API_SCOPES, &scope.name, UNASSIGNED).await? {
            tracing::warn!(name = %scope.name, "api scope name already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(scope)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO api_scopes (
                name, display_name, description, enabled, required, emphasize,
                show_in_discovery_document
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&scope.name)
        .bind(&scope.display_name)
        .bind(&scope.description)
        .bind(scope.enabled)
        .bind(scope.required)
        .bind(scope.emphasize)
        .bind(scope.show_in_discovery_document)
        .execute(uow.conn())
        .await
        .map_err(|e| MetadataError::from_insert(e, || rows::key_detail(scope)))?;

        let id = result.last_insert_rowid();
        let mut written = 1;
        let conn = uow.conn();
        written += rows::insert_all(conn, &API_SCOPE_PROPERTIES, id, &scope.properties).await?;
        written += rows::insert_all(conn, &API_SCOPE_CLAIMS, id, &scope.user_claims).await?;
        uow.record(written);

        tracing::info!(id, name = %scope.name, rows = written, "api scope added");
        Ok(id)
    }

    async fn update_api_scope(&self, uow: &mut UnitOfWork, scope: &ApiScope) -> MetadataResult<()> {
        rows::require_stored(uow.conn(), &API_SCOPES, scope).await?;
        if rows::key_taken(uow.conn(), &API_SCOPES, &scope.name, scope.id).await? {
            tracing::warn!(id = scope.id, name = %scope.name, "api scope name already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(scope)));
        }

        let result = sqlx::query(
            r#"
            UPDATE api_scopes SET
                name = ?, display_name = ?, description = ?, enabled = ?,
                required = ?, emphasize = ?, show_in_discovery_document = ?
            WHERE id = ?
            "#,
        )
        .bind(&scope.name)
        .bind(&scope.display_name)
        .bind(&scope.description)
        .bind(scope.enabled)
        .bind(scope.required)
        .bind(scope.emphasize)
        .bind(scope.show_in_discovery_document)
        .bind(scope.id)
        .execute(uow.conn())
        .await
        .map_err(|e| MetadataError::from_insert(e, || rows::key_detail(scope)))?;

        let mut written = result.rows_affected();
        let conn = uow.conn();
        written += rows::reconcile(conn, &API_SCOPE_PROPERTIES, scope.id, &scope.properties).await?;
        written += rows::reconcile(conn, &API_SCOPE_CLAIMS, scope.id, &scope.user_claims).await?;
        uow.record(written);

        tracing::info!(id = scope.id, name = %scope.name, rows = written, "api scope updated");
        Ok(())
    }

    async fn delete_api_scope(&self, uow: &mut UnitOfWork, id: SurrogateKey) -> MetadataResult<()> {
        let removed = rows::delete_root(uow.conn(), &API_SCOPES, id).await?;
        uow.record(removed);
        tracing::info!(id, "api scope deleted");
        Ok(())
    }

    async fn get_api_scope_properties(
        &self,
        scope_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>> {
        let mut conn = self.conn().await?;
        rows::page(&mut conn, &API_SCOPE_PROPERTIES, scope_id, page).await
    }

    async fn get_api_scope_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &API_SCOPE_PROPERTIES, property_id).await
    }

    async fn add_api_scope_property(
        &self,
        uow: &mut UnitOfWork,
        scope_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &API_SCOPES, scope_id).await?;
        let id = rows::insert(uow.conn(), &API_SCOPE_PROPERTIES, scope_id, property).await?;
        uow.record(1);
        tracing::info!(id, scope_id, key = %property.key, "api scope property added");
        Ok(id)
    }

    async fn update_api_scope_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()> {
        let written = rows::update(uow.conn(), &API_SCOPE_PROPERTIES, property).await?;
        uow.record(written);
        tracing::info!(id = property.id, key = %property.key, "api scope property updated");
        Ok(())
    }

    async fn delete_api_scope_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &API_SCOPE_PROPERTIES, property_id).await?;
        uow.record(removed);
        tracing::info!(id = property_id, "api scope property deleted");
        Ok(())
    }
}

// =============================================================================
// Identity resources
// =============================================================================

const IDENTITY_RESOURCES: RootTable = RootTable {
    table: "identity_resources",
    key_column: "name",
    search_columns: &["name"],
    label: IdentityResource::KIND,
};

const IDENTITY_RESOURCE_PROPERTIES: ChildTable = ChildTable {
    table: "identity_resource_properties",
    label: "identity resource property",
};

const IDENTITY_RESOURCE_CLAIMS: ChildTable = ChildTable {
    table: "identity_resource_claims",
    label: "identity resource claim",
};

#[async_trait]
impl IdentityResourceRepo for SqliteStore {
    async fn get_identity_resources(
        &self,
        search: &str,
        page: Page,
    ) -> MetadataResult<PagedList<IdentityResource>> {
        let mut conn = self.conn().await?;
        rows::search_page(&mut conn, &IDENTITY_RESOURCES, search, page).await
    }

    async fn get_identity_resource(
        &self,
        id: SurrogateKey,
    ) -> MetadataResult<Option<IdentityResource>> {
        let mut conn = self.conn().await?;
        let Some(mut resource) =
            rows::fetch_root::<IdentityResource>(&mut conn, &IDENTITY_RESOURCES, id).await?
        else {
            return Ok(None);
        };
        resource.properties = rows::list(&mut conn, &IDENTITY_RESOURCE_PROPERTIES, id).await?;
        resource.user_claims = rows::list(&mut conn, &IDENTITY_RESOURCE_CLAIMS, id).await?;
        Ok(Some(resource))
    }

    async fn get_identity_resource_name(
        &self,
        id: SurrogateKey,
    ) -> MetadataResult<Option<String>> {
        let mut conn = self.conn().await?;
        rows::business_key(&mut conn, &IDENTITY_RESOURCES, id).await
    }

    async fn get_identity_resource_names(
        &self,
        search: &str,
        limit: u32,
    ) -> MetadataResult<Vec<String>> {
        let mut conn = self.conn().await?;
        rows::key_listing(&mut conn, &IDENTITY_RESOURCES, search, limit).await
    }

    async fn can_insert_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &IdentityResource,
    ) -> MetadataResult<bool> {
        let taken =
            rows::key_taken(uow.conn(), &IDENTITY_RESOURCES, &resource.name, resource.id).await?;
        Ok(!taken)
    }

    async fn add_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &IdentityResource,
    ) -> MetadataResult<SurrogateKey> {
        if rows::key_taken(uow.conn(), &IDENTITY_RESOURCES, &resource.name, UNASSIGNED).await? {
            tracing::warn!(name = %resource.name, "identity resource name already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(resource)));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO identity_resources (
                name, display_name, description, enabled, required, emphasize,
                show_in_discovery_document, non_editable, created, updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&resource.name)
        .bind(&resource.display_name)
        .bind(&resource.description)
        .bind(resource.enabled)
        .bind(resource.required)
        .bind(resource.emphasize)
        .bind(resource.show_in_discovery_document)
        .bind(resource.non_editable)
        .bind(resource.created)
        .bind(resource.updated)
        .execute(uow.conn())
        .await
        .map_err(|e| {
            MetadataError::from_insert(e, || rows::key_detail(resource))
        })?;

        let id = result.last_insert_rowid();
        let mut written = 1;
        let conn = uow.conn();
        written +=
            rows::insert_all(conn, &IDENTITY_RESOURCE_PROPERTIES, id, &resource.properties).await?;
        written +=
            rows::insert_all(conn, &IDENTITY_RESOURCE_CLAIMS, id, &resource.user_claims).await?;
        uow.record(written);

        tracing::info!(id, name = %resource.name, rows = written, "identity resource added");
        Ok(id)
    }

    async fn update_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        resource: &IdentityResource,
    ) -> MetadataResult<()> {
        rows::require_stored(uow.conn(), &IDENTITY_RESOURCES, resource).await?;
        if rows::key_taken(uow.conn(), &IDENTITY_RESOURCES, &resource.name, resource.id).await? {
            tracing::warn!(id = resource.id, name = %resource.name, "identity resource name already in use");
            return Err(MetadataError::AlreadyExists(rows::key_detail(resource)));
        }

        let result = sqlx::query(
            r#"
            UPDATE identity_resources SET
                name = ?, display_name = ?, description = ?, enabled = ?,
                required = ?, emphasize = ?, show_in_discovery_document = ?,
                non_editable = ?, updated = ?
            WHERE id = ?
            "#,
        )
        .bind(&resource.name)
        .bind(&resource.display_name)
        .bind(&resource.description)
        .bind(resource.enabled)
        .bind(resource.required)
        .bind(resource.emphasize)
        .bind(resource.show_in_discovery_document)
        .bind(resource.non_editable)
        .bind(resource.updated)
        .bind(resource.id)
        .execute(uow.conn())
        .await
        .map_err(|e| {
            MetadataError::from_insert(e, || rows::key_detail(resource))
        })?;

        let id = resource.id;
        let mut written = result.rows_affected();
        let conn = uow.conn();
        written +=
            rows::reconcile(conn, &IDENTITY_RESOURCE_PROPERTIES, id, &resource.properties).await?;
        written +=
            rows::reconcile(conn, &IDENTITY_RESOURCE_CLAIMS, id, &resource.user_claims).await?;
        uow.record(written);

        tracing::info!(id, name = %resource.name, rows = written, "identity resource updated");
        Ok(())
    }

    async fn delete_identity_resource(
        &self,
        uow: &mut UnitOfWork,
        id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete_root(uow.conn(), &IDENTITY_RESOURCES, id).await?;
        uow.record(removed);
        tracing::info!(id, "identity resource deleted");
        Ok(())
    }

    async fn get_identity_resource_properties(
        &self,
        resource_id: SurrogateKey,
        page: Page,
    ) -> MetadataResult<PagedList<Property>> {
        let mut conn = self.conn().await?;
        rows::page(&mut conn, &IDENTITY_RESOURCE_PROPERTIES, resource_id, page).await
    }

    async fn get_identity_resource_property(
        &self,
        property_id: SurrogateKey,
    ) -> MetadataResult<Owned<Property>> {
        let mut conn = self.conn().await?;
        rows::get(&mut conn, &IDENTITY_RESOURCE_PROPERTIES, property_id).await
    }

    async fn add_identity_resource_property(
        &self,
        uow: &mut UnitOfWork,
        resource_id: SurrogateKey,
        property: &Property,
    ) -> MetadataResult<SurrogateKey> {
        rows::require_root(uow.conn(), &IDENTITY_RESOURCES, resource_id).await?;
        let id =
            rows::insert(uow.conn(), &IDENTITY_RESOURCE_PROPERTIES, resource_id, property).await?;
        uow.record(1);
        tracing::info!(id, resource_id, key = %property.key, "identity resource property added");
        Ok(id)
    }

    async fn update_identity_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property: &Property,
    ) -> MetadataResult<()> {
        let written = rows::update(uow.conn(), &IDENTITY_RESOURCE_PROPERTIES, property).await?;
        uow.record(written);
        tracing::info!(id = property.id, key = %property.key, "identity resource property updated");
        Ok(())
    }

    async fn delete_identity_resource_property(
        &self,
        uow: &mut UnitOfWork,
        property_id: SurrogateKey,
    ) -> MetadataResult<()> {
        let removed = rows::delete(uow.conn(), &IDENTITY_RESOURCE_PROPERTIES, property_id).await?;
        uow.record(removed);
        tracing::info!(id = property_id, "identity resource property deleted");
        Ok(())
    }
}
