//! Integration tests for the persisted grant service.

mod common;

use common::*;
use gatehouse_admin::audit::AuditEntity;
use gatehouse_admin::{AdminError, ResourceCode};
use gatehouse_core::Page;
use gatehouse_metadata::repos::PersistedGrantRepo;

async fn seed(admin: &TestAdmin) {
    let mut uow = admin.store.begin().await.unwrap();
    for (key, subject) in [("k1", "alice"), ("k2", "alice"), ("k3", "alicia"), ("k4", "bob")] {
        admin
            .store
            .add_persisted_grant(&mut uow, &grant(key, subject))
            .await
            .unwrap();
    }
    uow.commit().await.unwrap();
}

#[tokio::test]
async fn test_purge_by_subject_returns_count_then_zero() {
    let admin = TestAdmin::new().await;
    seed(&admin).await;
    let grants = admin.grants();

    assert_eq!(grants.delete_persisted_grants_by_subject("alice").await.unwrap(), 2);
    assert_eq!(grants.delete_persisted_grants_by_subject("alice").await.unwrap(), 0);

    let events = admin.audit.take();
    assert_eq!(events.len(), 1);
    let record = events[0].record();
    assert_eq!(events[0].action(), "deleted");
    assert_eq!(record.entity, AuditEntity::PersistedGrant);
    assert_eq!(record.target_key, "alice");
    assert_eq!(record.before.as_ref().unwrap()["removed"], 2);

    assert_eq!(admin.count("persisted_grants").await, 2);
    assert!(!grants.exists_persisted_grants_for_subject("alice").await.unwrap());
    assert!(grants.exists_persisted_grants_for_subject("alicia").await.unwrap());
}

#[tokio::test]
async fn test_delete_single_grant_is_idempotent() {
    let admin = TestAdmin::new().await;
    seed(&admin).await;
    let grants = admin.grants();

    assert_eq!(grants.delete_persisted_grant("k4").await.unwrap(), 1);
    assert_eq!(grants.delete_persisted_grant("k4").await.unwrap(), 0);
    assert_eq!(grants.delete_persisted_grant("never-existed").await.unwrap(), 0);

    let events = admin.audit.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].record().before.as_ref().unwrap()["key"], "k4");

    let err = grants.get_persisted_grant("k4").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.resource_code(), Some(ResourceCode::PersistedGrantDoesNotExist));
}

#[tokio::test]
async fn test_grant_reads() {
    let admin = TestAdmin::new().await;
    seed(&admin).await;
    let grants = admin.grants();

    let by_search = grants
        .get_persisted_grants_by_subjects("ali", Page::default())
        .await
        .unwrap();
    assert_eq!(by_search.total_count, 3);

    let by_wildcard = grants
        .get_persisted_grants_by_subjects("alic*", Page::default())
        .await
        .unwrap();
    assert_eq!(by_wildcard.total_count, 3);

    let by_subject = grants
        .get_persisted_grants_by_subject("alice", Page::new(1, 1))
        .await
        .unwrap();
    assert_eq!(by_subject.total_count, 2);
    assert_eq!(by_subject.items.len(), 1);
    assert_eq!(by_subject.items[0].key, "k1");

    let grant = grants.get_persisted_grant("k3").await.unwrap();
    assert_eq!(grant.subject_id.as_deref(), Some("alicia"));
    assert_eq!(grant.creation_time, FIXED_TIME);

    let err = grants
        .get_persisted_grants_by_subject(" ", Page::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Validation(_)));

    assert!(admin.audit.is_empty());
}
