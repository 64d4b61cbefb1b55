//! Shared state handed to every service.

use crate::audit::{AuditEntity, AuditEvent, AuditRecord, AuditSink};
use crate::clone::{ClonePolicy, CollectionKind};
use gatehouse_core::Page;
use gatehouse_core::config::{AdminConfig, AppConfig, CloneConfig};
use gatehouse_metadata::MetadataStore;
use std::fmt::Display;
use std::sync::Arc;

/// Store handle, audit sink and acting principal.
///
/// Cheap to clone; derive a per-request context with [`with_actor`](Self::with_actor).
#[derive(Clone)]
pub struct AdminContext {
    store: Arc<dyn MetadataStore>,
    audit: Arc<dyn AuditSink>,
    actor: String,
    default_page_size: u32,
    clone: CloneConfig,
}

impl AdminContext {
    /// Context with the default admin and clone settings.
    pub fn new(store: Arc<dyn MetadataStore>, audit: Arc<dyn AuditSink>) -> Self {
        let admin = AdminConfig::default();
        Self {
            store,
            audit,
            actor: admin.default_actor,
            default_page_size: admin.default_page_size,
            clone: CloneConfig::default(),
        }
    }

    pub fn from_config(
        store: Arc<dyn MetadataStore>,
        audit: Arc<dyn AuditSink>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            audit,
            actor: config.admin.default_actor.clone(),
            default_page_size: config.admin.default_page_size,
            clone: config.clone.clone(),
        }
    }

    /// Same context, acting as `actor`.
    pub fn with_actor(&self, actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            ..self.clone()
        }
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Page request where a size of `0` means the configured default.
    pub fn page(&self, number: i64, size: u32) -> Page {
        let size = if size == 0 {
            self.default_page_size
        } else {
            size
        };
        Page::new(number, size)
    }

    /// Clone policy built from the configured defaults.
    pub fn clone_policy<C: CollectionKind>(&self) -> ClonePolicy<C> {
        ClonePolicy::from_config(&self.clone)
    }

    pub(crate) fn record(&self, entity: AuditEntity, target_key: impl Display) -> AuditRecord {
        AuditRecord::new(entity, target_key, self.actor.as_str())
    }

    pub(crate) async fn emit(&self, event: AuditEvent) {
        self.audit.record(event).await;
    }
}

impl std::fmt::Debug for AdminContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminContext")
            .field("actor", &self.actor)
            .field("default_page_size", &self.default_page_size)
            .field("clone", &self.clone)
            .finish_non_exhaustive()
    }
}
