//! Integration tests for the client service.

mod common;

use common::*;
use gatehouse_admin::audit::AuditEntity;
use gatehouse_admin::clone::ClientCollection;
use gatehouse_admin::dtos::{ClientDto, PropertyDto, SecretDto};
use gatehouse_admin::{AdminContext, AdminError, AuditSink, ClientService, ClonePolicy, ResourceCode};
use gatehouse_core::config::{AppConfig, CloneConfig};
use gatehouse_core::{Page, UNASSIGNED};
use gatehouse_metadata::models::ClientValueKind;
use std::collections::HashSet;
use std::sync::Arc;

/// Clear everything storage assigns so DTOs compare by content.
fn strip(mut dto: ClientDto) -> ClientDto {
    dto.id = UNASSIGNED;
    dto.created = None;
    dto.updated = None;
    for secret in &mut dto.secrets {
        secret.id = UNASSIGNED;
        secret.created = None;
    }
    dto.claims.iter_mut().for_each(|c| c.id = UNASSIGNED);
    dto.properties.iter_mut().for_each(|p| p.id = UNASSIGNED);
    dto
}

fn assert_code(err: &AdminError, code: ResourceCode) {
    assert_eq!(err.resource_code(), Some(code), "unexpected error: {err}");
}

#[tokio::test]
async fn test_add_conflict_then_clone_scenario() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();

    let id = clients.add_client(&client_dto("app1")).await.unwrap();
    assert_eq!(id, 1);

    let err = clients.add_client(&client_dto("app1")).await.unwrap_err();
    assert!(err.is_conflict());
    assert_code(&err, ResourceCode::ClientExistsValue);

    let copy_id = clients.clone_client(1, "app1-copy").await.unwrap();
    assert_eq!(copy_id, 2);

    let copy = clients.get_client(2).await.unwrap();
    assert_eq!(copy.client_id, "app1-copy");
    assert!(copy.secrets.is_empty());
    assert!(copy.client_name.is_none());
    assert_eq!(copy.allowed_scopes, vec!["openid", "profile"]);
    assert_eq!(copy.properties.len(), 1);

    let source_ids: HashSet<_> = clients
        .get_client_values(1, ClientValueKind::AllowedScope)
        .await
        .unwrap()
        .iter()
        .map(|v| v.id)
        .collect();
    let copy_ids: HashSet<_> = clients
        .get_client_values(2, ClientValueKind::AllowedScope)
        .await
        .unwrap()
        .iter()
        .map(|v| v.id)
        .collect();
    assert_eq!(copy_ids.len(), 2);
    assert!(source_ids.is_disjoint(&copy_ids));
    assert_ne!(copy.properties[0].id, clients.get_client(1).await.unwrap().properties[0].id);

    // source keeps its secret
    assert_eq!(clients.get_client(1).await.unwrap().secrets.len(), 1);
}

#[tokio::test]
async fn test_add_then_get_round_trips() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    let dto = client_dto("web");

    let id = clients.add_client(&dto).await.unwrap();
    let loaded = clients.get_client(id).await.unwrap();

    assert_eq!(loaded.id, id);
    assert!(loaded.created.is_some());
    assert!(loaded.updated.is_none());
    assert!(loaded.secrets.iter().all(|s| s.id > 0));
    assert_eq!(strip(loaded), strip(dto));
}

#[tokio::test]
async fn test_paging_over_twenty_five_clients() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    for n in 1..=25 {
        clients
            .add_client(&ClientDto::new(format!("client-{n:02}")))
            .await
            .unwrap();
    }

    let page = clients.get_clients("", Page::new(2, 10)).await.unwrap();
    assert_eq!(page.total_count, 25);
    assert_eq!(page.page, 2);
    let ids: Vec<_> = page.items.iter().map(|c| c.client_id.as_str()).collect();
    assert_eq!(ids.len(), 10);
    assert_eq!(ids.first(), Some(&"client-11"));
    assert_eq!(ids.last(), Some(&"client-20"));

    let first = clients.get_clients("", Page::new(0, 10)).await.unwrap();
    assert_eq!(first.items[0].client_id, "client-01");
    assert_eq!(first.page, 1);

    let past_end = clients.get_clients("", Page::new(4, 10)).await.unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_count, 25);

    let defaulted = clients
        .get_clients("", admin.ctx.page(1, 0))
        .await
        .unwrap();
    assert_eq!(defaulted.len(), 10);

    let searched = clients.get_clients("client-2*", Page::default()).await.unwrap();
    assert_eq!(searched.total_count, 6);

    let names = clients.get_client_ids("client-1", 3).await.unwrap();
    assert_eq!(names, vec!["client-10", "client-11", "client-12"]);
}

#[tokio::test]
async fn test_update_keeps_retained_children() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    let id = clients.add_client(&client_dto("web")).await.unwrap();

    let scopes_before = clients
        .get_client_values(id, ClientValueKind::AllowedScope)
        .await
        .unwrap();
    let openid_id = scopes_before[0].id;
    let before = clients.get_client(id).await.unwrap();

    let mut dto = before.clone();
    dto.client_name = Some("Web v2".to_string());
    dto.allowed_scopes = vec!["openid".to_string(), "email".to_string()];
    clients.update_client(&dto).await.unwrap();

    let after = clients.get_client(id).await.unwrap();
    assert_eq!(after.client_name.as_deref(), Some("Web v2"));
    assert_eq!(after.allowed_scopes, vec!["openid", "email"]);
    assert_eq!(after.created, before.created);
    assert!(after.updated.is_some());
    assert_eq!(after.secrets[0].id, before.secrets[0].id);
    assert_eq!(after.properties[0].id, before.properties[0].id);

    let scopes_after = clients
        .get_client_values(id, ClientValueKind::AllowedScope)
        .await
        .unwrap();
    assert_eq!(scopes_after[0].id, openid_id);
    assert_eq!(scopes_after[0].value, "openid");
    assert!(scopes_after[1].id > scopes_before[1].id);
}

#[tokio::test]
async fn test_update_from_serialized_client_keeps_secret_values() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    let id = clients.add_client(&client_dto("web")).await.unwrap();
    let before = clients.get_client(id).await.unwrap();

    let json = serde_json::to_string(&before).unwrap();
    assert!(!json.contains("s3cr3t-hash"));
    let mut dto: ClientDto = serde_json::from_str(&json).unwrap();
    assert!(dto.secrets[0].value.is_empty());
    dto.description = Some("edited over the wire".to_string());
    clients.update_client(&dto).await.unwrap();

    let after = clients.get_client(id).await.unwrap();
    assert_eq!(after.description.as_deref(), Some("edited over the wire"));
    assert_eq!(after.secrets.len(), 1);
    assert_eq!(after.secrets[0].id, before.secrets[0].id);
    let secret = clients.get_client_secret(after.secrets[0].id).await.unwrap();
    assert_eq!(secret.item.value, "s3cr3t-hash");

    // A new secret still needs a value.
    dto.secrets.push(SecretDto::new(""));
    let err = clients.update_client(&dto).await.unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)), "unexpected error: {err}");

    // So does one claiming an id the client never had.
    dto.secrets.pop();
    dto.secrets[0].id = 999;
    let err = clients.update_client(&dto).await.unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)), "unexpected error: {err}");
    assert_eq!(admin.count("client_secrets").await, 1);
}

#[tokio::test]
async fn test_duplicate_property_keys_use_property_code() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();

    let mut dto = client_dto("web");
    dto.properties.push(PropertyDto::new(&dto.properties[0].key, "other"));
    let err = clients.add_client(&dto).await.unwrap_err();
    assert_code(&err, ResourceCode::ClientPropertyExistsValue);
    assert_eq!(admin.count("clients").await, 0);

    let id = clients.add_client(&client_dto("web")).await.unwrap();
    let mut dto = clients.get_client(id).await.unwrap();
    dto.properties.push(PropertyDto::new(&dto.properties[0].key, "other"));
    let err = clients.update_client(&dto).await.unwrap_err();
    assert_code(&err, ResourceCode::ClientPropertyExistsValue);
    assert_eq!(admin.count("client_properties").await, 1);
}

#[tokio::test]
async fn test_update_rejects_missing_and_taken_keys() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    clients.add_client(&ClientDto::new("a")).await.unwrap();
    let b = clients.add_client(&ClientDto::new("b")).await.unwrap();

    let mut dto = clients.get_client(b).await.unwrap();
    dto.client_id = "a".to_string();
    let err = clients.update_client(&dto).await.unwrap_err();
    assert_code(&err, ResourceCode::ClientExistsValue);

    let mut ghost = ClientDto::new("ghost");
    ghost.id = 999;
    let err = clients.update_client(&ghost).await.unwrap_err();
    assert!(err.is_not_found());
    assert_code(&err, ResourceCode::ClientDoesNotExist);

    assert_eq!(clients.get_client(b).await.unwrap().client_id, "b");
}

#[tokio::test]
async fn test_delete_cascades_and_then_get_fails() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    let id = clients.add_client(&client_dto("web")).await.unwrap();

    clients.delete_client(id).await.unwrap();

    let err = clients.get_client(id).await.unwrap_err();
    assert_code(&err, ResourceCode::ClientDoesNotExist);
    let err = clients.delete_client(id).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(admin.count("clients").await, 0);
    assert_eq!(admin.count("client_scopes").await, 0);
    assert_eq!(admin.count("client_secrets").await, 0);
}

#[tokio::test]
async fn test_failed_clone_leaves_no_trace() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    let app1 = clients.add_client(&client_dto("app1")).await.unwrap();
    clients.add_client(&client_dto("app2")).await.unwrap();

    let counts = admin.table_counts().await;
    let events = admin.audit.len();

    let err = clients.clone_client(app1, "app2").await.unwrap_err();
    assert_code(&err, ResourceCode::ClientExistsValue);

    let err = clients.clone_client(999, "app3").await.unwrap_err();
    assert_code(&err, ResourceCode::ClientDoesNotExist);

    let err = clients.clone_client(app1, " ").await.unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));

    assert_eq!(admin.table_counts().await, counts);
    assert_eq!(admin.audit.len(), events);
}

#[tokio::test]
async fn test_clone_with_policy() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    let id = clients.add_client(&client_dto("app1")).await.unwrap();

    let policy = ClonePolicy::new()
        .include(ClientCollection::Secrets)
        .exclude(ClientCollection::AllowedScopes)
        .with_display_name("App One (copy)");
    let copy_id = clients
        .clone_client_with(id, "app1-copy", &policy)
        .await
        .unwrap();

    let copy = clients.get_client(copy_id).await.unwrap();
    assert_eq!(copy.secrets.len(), 1);
    assert_eq!(copy.secrets[0].value, "s3cr3t-hash");
    assert!(copy.allowed_scopes.is_empty());
    assert_eq!(copy.redirect_uris.len(), 1);
    assert_eq!(copy.client_name.as_deref(), Some("App One (copy)"));
}

#[tokio::test]
async fn test_configured_clone_defaults() {
    let admin = TestAdmin::new().await;
    let config = AppConfig {
        clone: CloneConfig {
            include_secrets: true,
            keep_display_name: true,
        },
        ..AppConfig::default()
    };
    let sink: Arc<dyn AuditSink> = admin.audit.clone();
    let clients = ClientService::new(AdminContext::from_config(
        admin.store.clone(),
        sink,
        &config,
    ));

    let id = clients.add_client(&client_dto("app1")).await.unwrap();
    let copy_id = clients.clone_client(id, "app1-copy").await.unwrap();

    let copy = clients.get_client(copy_id).await.unwrap();
    assert_eq!(copy.secrets.len(), 1);
    assert_eq!(copy.client_name.as_deref(), Some("app1 display"));
    assert_eq!(clients.context().actor(), "system");
}

#[tokio::test]
async fn test_sub_entities() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();
    let id = clients.add_client(&ClientDto::new("app1")).await.unwrap();

    let prop_id = clients
        .add_client_property(id, &PropertyDto::new("tier", "gold"))
        .await
        .unwrap();
    let owned = clients.get_client_property(prop_id).await.unwrap();
    assert_eq!(owned.parent_id, id);
    assert_eq!(owned.parent_key, "app1");
    assert_eq!(owned.item.value, "gold");

    let err = clients
        .add_client_property(id, &PropertyDto::new("tier", "silver"))
        .await
        .unwrap_err();
    assert_code(&err, ResourceCode::ClientPropertyExistsValue);

    let page = clients.get_client_properties(id, Page::default()).await.unwrap();
    assert_eq!(page.total_count, 1);

    let err = clients
        .add_client_secret(42, &SecretDto::new("hash"))
        .await
        .unwrap_err();
    assert_code(&err, ResourceCode::ClientDoesNotExist);

    let err = clients.get_client_secret(42).await.unwrap_err();
    assert_code(&err, ResourceCode::ClientSecretDoesNotExist);

    let err = clients.delete_client_claim(42).await.unwrap_err();
    assert_code(&err, ResourceCode::ClientClaimDoesNotExist);

    let err = clients
        .delete_client_value(ClientValueKind::AllowedCorsOrigin, 42)
        .await
        .unwrap_err();
    assert_code(&err, ResourceCode::ClientValueDoesNotExist);

    let err = clients
        .get_client_claims(42, Page::default())
        .await
        .unwrap_err();
    assert_code(&err, ResourceCode::ClientDoesNotExist);

    let origin_id = clients
        .add_client_value(id, ClientValueKind::AllowedCorsOrigin, "https://app.example.com")
        .await
        .unwrap();
    let origins = clients
        .get_client_values(id, ClientValueKind::AllowedCorsOrigin)
        .await
        .unwrap();
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0].id, origin_id);
}

#[tokio::test]
async fn test_validation_happens_before_storage() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();

    let err = clients.add_client(&ClientDto::new("  ")).await.unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));
    assert_eq!(err.code(), "validation_failed");

    let id = clients.add_client(&ClientDto::new("app1")).await.unwrap();
    let err = clients
        .add_client_value(id, ClientValueKind::RedirectUri, "")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));

    assert_eq!(admin.count("clients").await, 1);
    assert_eq!(admin.count("client_redirect_uris").await, 0);
    assert_eq!(admin.audit.len(), 1);
}

#[tokio::test]
async fn test_one_audit_event_per_mutation() {
    let admin = TestAdmin::new().await;
    let clients = admin.clients();

    let id = clients.add_client(&ClientDto::new("app1")).await.unwrap();
    let prop_id = clients
        .add_client_property(id, &PropertyDto::new("tier", "gold"))
        .await
        .unwrap();
    let mut property = PropertyDto::new("tier", "platinum");
    property.id = prop_id;
    clients.update_client_property(&property).await.unwrap();
    clients.delete_client_property(prop_id).await.unwrap();
    let uri_id = clients
        .add_client_value(id, ClientValueKind::RedirectUri, "https://app.example.com/cb")
        .await
        .unwrap();
    clients
        .delete_client_value(ClientValueKind::RedirectUri, uri_id)
        .await
        .unwrap();
    let secret_id = clients
        .add_client_secret(id, &SecretDto::new("hash"))
        .await
        .unwrap();
    clients.delete_client_secret(secret_id).await.unwrap();
    clients.clone_client(id, "app1-copy").await.unwrap();

    let events = admin.audit.take();
    let actions: Vec<_> = events.iter().map(|e| e.action()).collect();
    assert_eq!(
        actions,
        vec![
            "created", "created", "updated", "deleted", "created", "deleted", "created", "deleted",
            "cloned"
        ]
    );
    assert!(events.iter().all(|e| e.record().actor == "tester"));

    let root = events[0].record();
    assert_eq!(root.entity, AuditEntity::Client);
    assert_eq!(root.target_key, "app1");
    assert!(root.before.is_none());
    assert!(root.parent_key.is_none());

    for event in &events[1..8] {
        assert_eq!(event.record().parent_key.as_deref(), Some("app1"));
    }

    let updated = events[2].record();
    assert_eq!(updated.target_key, prop_id.to_string());
    assert_eq!(updated.before.as_ref().unwrap()["value"], "gold");
    assert_eq!(updated.after.as_ref().unwrap()["value"], "platinum");

    let secret_added = events[6].record();
    assert_eq!(secret_added.entity, AuditEntity::ClientSecret);
    assert!(secret_added.after.as_ref().unwrap().get("value").is_none());

    let cloned = events[8].record();
    assert_eq!(cloned.target_key, "app1-copy");
    assert_eq!(cloned.before.as_ref().unwrap()["client_id"], "app1");
    assert_eq!(cloned.after.as_ref().unwrap()["client_id"], "app1-copy");
}
