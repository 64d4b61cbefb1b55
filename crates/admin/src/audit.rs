//! Audit events emitted by every service mutation.
//!
//! Events carry JSON snapshots of the affected record before and after the
//! change. Where they end up is the sink's business; this crate ships a sink
//! that writes structured `tracing` events and one that keeps events in
//! memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt::Display;
use std::sync::Mutex;
use time::OffsetDateTime;
use uuid::Uuid;

/// Kind of record an event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    Client,
    ClientSecret,
    ClientClaim,
    ClientProperty,
    ClientValue,
    ApiResource,
    ApiResourceSecret,
    ApiResourceProperty,
    ApiScope,
    ApiScopeProperty,
    IdentityResource,
    IdentityResourceProperty,
    PersistedGrant,
}

impl AuditEntity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::ClientSecret => "client_secret",
            Self::ClientClaim => "client_claim",
            Self::ClientProperty => "client_property",
            Self::ClientValue => "client_value",
            Self::ApiResource => "api_resource",
            Self::ApiResourceSecret => "api_resource_secret",
            Self::ApiResourceProperty => "api_resource_property",
            Self::ApiScope => "api_scope",
            Self::ApiScopeProperty => "api_scope_property",
            Self::IdentityResource => "identity_resource",
            Self::IdentityResourceProperty => "identity_resource_property",
            Self::PersistedGrant => "persisted_grant",
        }
    }
}

/// Payload shared by every audit event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub entity: AuditEntity,
    /// Business key (or surrogate key for sub-entities) of the changed record.
    pub target_key: String,
    /// Business key of the owning aggregate, for sub-entity changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    pub actor: String,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<JsonValue>,
}

impl AuditRecord {
    pub fn new(entity: AuditEntity, target_key: impl Display, actor: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity,
            target_key: target_key.to_string(),
            parent_key: None,
            actor: actor.into(),
            occurred_at: OffsetDateTime::now_utc(),
            before: None,
            after: None,
        }
    }

    pub fn with_parent(mut self, parent_key: impl Into<String>) -> Self {
        self.parent_key = Some(parent_key.into());
        self
    }

    pub fn with_before<T: Serialize>(mut self, before: &T) -> Self {
        self.before = snapshot(before);
        self
    }

    pub fn with_after<T: Serialize>(mut self, after: &T) -> Self {
        self.after = snapshot(after);
        self
    }
}

fn snapshot<T: Serialize>(value: &T) -> Option<JsonValue> {
    match serde_json::to_value(value) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize audit snapshot");
            None
        }
    }
}

/// A mutation, tagged by what happened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditEvent {
    Created(AuditRecord),
    Updated(AuditRecord),
    Deleted(AuditRecord),
    Cloned(AuditRecord),
}

impl AuditEvent {
    pub fn record(&self) -> &AuditRecord {
        match self {
            Self::Created(r) | Self::Updated(r) | Self::Deleted(r) | Self::Cloned(r) => r,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Deleted(_) => "deleted",
            Self::Cloned(_) => "cloned",
        }
    }
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one event. Called after the mutation has been committed.
    async fn record(&self, event: AuditEvent);
}

/// Writes each event as a structured `tracing` event on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        let record = event.record();
        let payload = serde_json::to_string(&event).unwrap_or_default();
        tracing::info!(
            target: "audit",
            event_id = %record.id,
            action = event.action(),
            entity = record.entity.as_str(),
            target_key = %record.target_key,
            parent_key = record.parent_key.as_deref(),
            actor = %record.actor,
            payload = %payload,
            "audit event"
        );
    }
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().clone()
    }

    /// Remove and return every event recorded so far.
    pub fn take(&self) -> Vec<AuditEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serializes_with_action_tag() {
        let record = AuditRecord::new(AuditEntity::ClientProperty, 12, "ops")
            .with_parent("web")
            .with_after(&json!({"key": "tier"}));
        let event = AuditEvent::Created(record);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "created");
        assert_eq!(json["entity"], "client_property");
        assert_eq!(json["target_key"], "12");
        assert_eq!(json["parent_key"], "web");
        assert!(json.get("before").is_none());

        let back: AuditEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditEvent::Created(AuditRecord::new(AuditEntity::ApiScope, "a", "x")))
            .await;
        sink.record(AuditEvent::Deleted(AuditRecord::new(AuditEntity::ApiScope, "a", "x")))
            .await;

        let actions: Vec<_> = sink.events().iter().map(|e| e.action()).collect();
        assert_eq!(actions, vec!["created", "deleted"]);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }
}
