//! Integration tests for the API resource, API scope and identity resource
//! services.

mod common;

use common::*;
use gatehouse_admin::clone::{ApiResourceCollection, IdentityResourceCollection};
use gatehouse_admin::dtos::{ApiResourceDto, PropertyDto, SecretDto};
use gatehouse_admin::{AdminError, ClonePolicy, ResourceCode};
use gatehouse_core::Page;

#[tokio::test]
async fn test_api_resource_lifecycle() {
    let admin = TestAdmin::new().await;
    let resources = admin.api_resources();

    let id = resources
        .add_api_resource(&api_resource_dto("orders"))
        .await
        .unwrap();
    let err = resources
        .add_api_resource(&api_resource_dto("orders"))
        .await
        .unwrap_err();
    assert_eq!(err.resource_code(), Some(ResourceCode::ApiResourceExistsValue));

    let loaded = resources.get_api_resource(id).await.unwrap();
    assert_eq!(loaded.scopes, vec!["orders.read", "orders.write"]);
    assert_eq!(loaded.user_claims, vec!["email"]);
    assert_eq!(loaded.secrets[0].value, "api-secret");

    let mut dto = loaded.clone();
    dto.scopes = vec!["orders.read".to_string()];
    dto.user_claims.push("role".to_string());
    resources.update_api_resource(&dto).await.unwrap();

    let updated = resources.get_api_resource(id).await.unwrap();
    assert_eq!(updated.scopes, vec!["orders.read"]);
    assert_eq!(updated.user_claims, vec!["email", "role"]);
    assert_eq!(updated.created, loaded.created);
    assert!(updated.updated.is_some());
    assert_eq!(admin.count("api_resource_scopes").await, 1);

    resources.delete_api_resource(id).await.unwrap();
    let err = resources.get_api_resource(id).await.unwrap_err();
    assert_eq!(err.resource_code(), Some(ResourceCode::ApiResourceDoesNotExist));
    assert_eq!(admin.count("api_resource_claims").await, 0);

    assert_eq!(admin.audit.len(), 3);
}

#[tokio::test]
async fn test_api_resource_clone_excludes_secrets_by_default() {
    let admin = TestAdmin::new().await;
    let resources = admin.api_resources();
    let id = resources
        .add_api_resource(&api_resource_dto("orders"))
        .await
        .unwrap();

    let copy_id = resources.clone_api_resource(id, "invoices").await.unwrap();
    let copy = resources.get_api_resource(copy_id).await.unwrap();
    assert_eq!(copy.name, "invoices");
    assert!(copy.secrets.is_empty());
    assert!(copy.display_name.is_none());
    assert_eq!(copy.scopes, vec!["orders.read", "orders.write"]);
    assert_eq!(copy.properties.len(), 1);

    let policy = ClonePolicy::new()
        .include(ApiResourceCollection::Secrets)
        .exclude(ApiResourceCollection::Scopes)
        .keep_display_name();
    let full_id = resources
        .clone_api_resource_with(id, "billing", &policy)
        .await
        .unwrap();
    let full = resources.get_api_resource(full_id).await.unwrap();
    assert_eq!(full.secrets.len(), 1);
    assert!(full.scopes.is_empty());
    assert_eq!(full.display_name.as_deref(), Some("orders api"));

    let counts = admin.table_counts().await;
    let err = resources
        .clone_api_resource(id, "billing")
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(admin.table_counts().await, counts);

    let names = resources.get_api_resource_names("", 0).await.unwrap();
    assert_eq!(names, vec!["billing", "invoices", "orders"]);
}

#[tokio::test]
async fn test_api_resource_sub_entities_carry_parent_name() {
    let admin = TestAdmin::new().await;
    let resources = admin.api_resources();
    let id = resources
        .add_api_resource(&api_resource_dto("orders"))
        .await
        .unwrap();
    admin.audit.take();

    let secret_id = resources
        .add_api_resource_secret(id, &SecretDto::new("second"))
        .await
        .unwrap();
    let secrets = resources
        .get_api_resource_secrets(id, Page::default())
        .await
        .unwrap();
    assert_eq!(secrets.total_count, 2);

    let owned = resources.get_api_resource_secret(secret_id).await.unwrap();
    assert_eq!(owned.parent_key, "orders");

    resources.delete_api_resource_secret(secret_id).await.unwrap();
    let err = resources
        .delete_api_resource_secret(secret_id)
        .await
        .unwrap_err();
    assert_eq!(
        err.resource_code(),
        Some(ResourceCode::ApiResourceSecretDoesNotExist)
    );

    let prop_id = resources
        .add_api_resource_property(id, &PropertyDto::new("team", "core"))
        .await
        .unwrap();
    let err = resources
        .add_api_resource_property(id, &PropertyDto::new("team", "edge"))
        .await
        .unwrap_err();
    assert_eq!(
        err.resource_code(),
        Some(ResourceCode::ApiResourcePropertyExistsValue)
    );
    resources.delete_api_resource_property(prop_id).await.unwrap();

    let events = admin.audit.take();
    assert_eq!(events.len(), 4);
    assert!(
        events
            .iter()
            .all(|e| e.record().parent_key.as_deref() == Some("orders"))
    );
}

#[tokio::test]
async fn test_api_scope_properties_and_names() {
    let admin = TestAdmin::new().await;
    let scopes = admin.api_scopes();

    let read = scopes.add_api_scope(&api_scope_dto("orders.read")).await.unwrap();
    scopes.add_api_scope(&api_scope_dto("orders.write")).await.unwrap();
    scopes.add_api_scope(&api_scope_dto("profile")).await.unwrap();

    let names = scopes.get_api_scope_names("orders", 0).await.unwrap();
    assert_eq!(names, vec!["orders.read", "orders.write"]);

    let page = scopes.get_api_scopes("orders*", Page::new(1, 1)).await.unwrap();
    assert_eq!(page.total_count, 2);
    assert_eq!(page.items[0].name, "orders.read");

    let prop_id = scopes
        .add_api_scope_property(read, &PropertyDto::new("audience", "internal"))
        .await
        .unwrap();
    let mut property = PropertyDto::new("audience", "public");
    property.id = prop_id;
    scopes.update_api_scope_property(&property).await.unwrap();

    let owned = scopes.get_api_scope_property(prop_id).await.unwrap();
    assert_eq!(owned.parent_key, "orders.read");
    assert_eq!(owned.item.value, "public");

    let mut missing = PropertyDto::new("audience", "x");
    missing.id = 999;
    let err = scopes.update_api_scope_property(&missing).await.unwrap_err();
    assert_eq!(
        err.resource_code(),
        Some(ResourceCode::ApiScopePropertyDoesNotExist)
    );

    let copy = scopes.clone_api_scope(read, "orders.audit").await.unwrap();
    let copy = scopes.get_api_scope(copy).await.unwrap();
    assert_eq!(copy.user_claims, vec!["role"]);
    assert_eq!(copy.properties.len(), 1);
    assert!(copy.display_name.is_none());
}

#[tokio::test]
async fn test_api_scope_rename_conflict() {
    let admin = TestAdmin::new().await;
    let scopes = admin.api_scopes();
    scopes.add_api_scope(&api_scope_dto("a")).await.unwrap();
    let b = scopes.add_api_scope(&api_scope_dto("b")).await.unwrap();

    let mut dto = scopes.get_api_scope(b).await.unwrap();
    dto.name = "a".to_string();
    let err = scopes.update_api_scope(&dto).await.unwrap_err();
    assert_eq!(err.resource_code(), Some(ResourceCode::ApiScopeExistsValue));

    let err = scopes.delete_api_scope(42).await.unwrap_err();
    assert_eq!(err.resource_code(), Some(ResourceCode::ApiScopeDoesNotExist));
}

#[tokio::test]
async fn test_identity_resource_lifecycle() {
    let admin = TestAdmin::new().await;
    let identity = admin.identity_resources();

    let id = identity
        .add_identity_resource(&identity_resource_dto("profile"))
        .await
        .unwrap();
    let loaded = identity.get_identity_resource(id).await.unwrap();
    assert_eq!(loaded.user_claims, vec!["name", "family_name"]);
    assert_eq!(loaded.display_name.as_deref(), Some("Your profile"));

    let err = identity
        .add_identity_resource(&identity_resource_dto(""))
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));

    let policy = ClonePolicy::new().exclude(IdentityResourceCollection::UserClaims);
    let copy_id = identity
        .clone_identity_resource_with(id, "profile-lite", &policy)
        .await
        .unwrap();
    let copy = identity.get_identity_resource(copy_id).await.unwrap();
    assert!(copy.user_claims.is_empty());

    let prop_id = identity
        .add_identity_resource_property(id, &PropertyDto::new("category", "standard"))
        .await
        .unwrap();
    let props = identity
        .get_identity_resource_properties(id, Page::default())
        .await
        .unwrap();
    assert_eq!(props.items[0].id, prop_id);

    identity.delete_identity_resource(id).await.unwrap();
    assert_eq!(admin.count("identity_resource_properties").await, 0);
    let err = identity
        .get_identity_resource_property(prop_id)
        .await
        .unwrap_err();
    assert_eq!(
        err.resource_code(),
        Some(ResourceCode::IdentityResourcePropertyDoesNotExist)
    );

    let names = identity.get_identity_resource_names("", 0).await.unwrap();
    assert_eq!(names, vec!["profile-lite"]);

    let actions: Vec<_> = admin.audit.events().iter().map(|e| e.action()).collect();
    assert_eq!(actions, vec!["created", "cloned", "created", "deleted"]);
}

#[tokio::test]
async fn test_api_resource_update_from_json_and_property_conflicts() {
    let admin = TestAdmin::new().await;
    let resources = admin.api_resources();
    let id = resources
        .add_api_resource(&api_resource_dto("orders"))
        .await
        .unwrap();

    let json = serde_json::to_value(resources.get_api_resource(id).await.unwrap()).unwrap();
    let mut dto: ApiResourceDto = serde_json::from_value(json).unwrap();
    dto.display_name = Some("Orders".to_string());
    resources.update_api_resource(&dto).await.unwrap();
    let updated = resources.get_api_resource(id).await.unwrap();
    assert_eq!(updated.secrets[0].value, "api-secret");

    dto.properties.push(PropertyDto::new("owner", "billing"));
    let err = resources.update_api_resource(&dto).await.unwrap_err();
    assert_eq!(
        err.resource_code(),
        Some(ResourceCode::ApiResourcePropertyExistsValue)
    );

    let mut scope = api_scope_dto("orders.read");
    scope.properties = vec![PropertyDto::new("tier", "a"), PropertyDto::new("tier", "b")];
    let err = admin.api_scopes().add_api_scope(&scope).await.unwrap_err();
    assert_eq!(
        err.resource_code(),
        Some(ResourceCode::ApiScopePropertyExistsValue)
    );
}
