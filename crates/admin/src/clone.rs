//! Aggregate cloning.
//!
//! A clone is a fresh aggregate built from a loaded source: every surrogate
//! key is unassigned, the business key is replaced, lifecycle timestamps are
//! reset and the collections excluded by the [`ClonePolicy`] are emptied. The
//! result is inserted like any new aggregate, so the parent link of every
//! child row is established inside the same unit of work as the root.

use gatehouse_core::config::CloneConfig;
use gatehouse_core::{Aggregate, UNASSIGNED};
use gatehouse_metadata::models::{ApiResource, ApiScope, Client, IdentityResource};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use time::OffsetDateTime;

/// Child collections of one aggregate type.
pub trait CollectionKind: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    /// Collections left out of a clone unless explicitly included.
    fn is_sensitive(self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientCollection {
    Secrets,
    Claims,
    Properties,
    RedirectUris,
    PostLogoutRedirectUris,
    AllowedScopes,
    AllowedGrantTypes,
    AllowedCorsOrigins,
    IdentityProviderRestrictions,
}

impl CollectionKind for ClientCollection {
    const ALL: &'static [Self] = &[
        Self::Secrets,
        Self::Claims,
        Self::Properties,
        Self::RedirectUris,
        Self::PostLogoutRedirectUris,
        Self::AllowedScopes,
        Self::AllowedGrantTypes,
        Self::AllowedCorsOrigins,
        Self::IdentityProviderRestrictions,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Secrets => "secrets",
            Self::Claims => "claims",
            Self::Properties => "properties",
            Self::RedirectUris => "redirect_uris",
            Self::PostLogoutRedirectUris => "post_logout_redirect_uris",
            Self::AllowedScopes => "allowed_scopes",
            Self::AllowedGrantTypes => "allowed_grant_types",
            Self::AllowedCorsOrigins => "allowed_cors_origins",
            Self::IdentityProviderRestrictions => "identity_provider_restrictions",
        }
    }

    fn is_sensitive(self) -> bool {
        matches!(self, Self::Secrets)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiResourceCollection {
    Secrets,
    Properties,
    UserClaims,
    Scopes,
}

impl CollectionKind for ApiResourceCollection {
    const ALL: &'static [Self] = &[
        Self::Secrets,
        Self::Properties,
        Self::UserClaims,
        Self::Scopes,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Secrets => "secrets",
            Self::Properties => "properties",
            Self::UserClaims => "user_claims",
            Self::Scopes => "scopes",
        }
    }

    fn is_sensitive(self) -> bool {
        matches!(self, Self::Secrets)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiScopeCollection {
    Properties,
    UserClaims,
}

impl CollectionKind for ApiScopeCollection {
    const ALL: &'static [Self] = &[Self::Properties, Self::UserClaims];

    fn as_str(self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::UserClaims => "user_claims",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityResourceCollection {
    Properties,
    UserClaims,
}

impl CollectionKind for IdentityResourceCollection {
    const ALL: &'static [Self] = &[Self::Properties, Self::UserClaims];

    fn as_str(self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::UserClaims => "user_claims",
        }
    }
}

/// What happens to the source's display name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DisplayNameRule {
    /// Clear it.
    #[default]
    Reset,
    /// Copy it unchanged.
    Keep,
    /// Use the given name instead.
    Replace(String),
}

/// Which collections a clone copies and what it does with the display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClonePolicy<C: CollectionKind> {
    excluded: HashSet<C>,
    display_name: DisplayNameRule,
}

impl<C: CollectionKind> ClonePolicy<C> {
    /// Copy everything except sensitive collections; reset the display name.
    pub fn new() -> Self {
        Self {
            excluded: C::ALL.iter().copied().filter(|c| c.is_sensitive()).collect(),
            display_name: DisplayNameRule::Reset,
        }
    }

    /// Copy every collection, sensitive ones included.
    pub fn everything() -> Self {
        Self {
            excluded: HashSet::new(),
            display_name: DisplayNameRule::Reset,
        }
    }

    pub fn from_config(config: &CloneConfig) -> Self {
        let policy = if config.include_secrets {
            Self::everything()
        } else {
            Self::new()
        };
        if config.keep_display_name {
            policy.keep_display_name()
        } else {
            policy
        }
    }

    pub fn include(mut self, collection: C) -> Self {
        self.excluded.remove(&collection);
        self
    }

    pub fn exclude(mut self, collection: C) -> Self {
        self.excluded.insert(collection);
        self
    }

    pub fn keep_display_name(mut self) -> Self {
        self.display_name = DisplayNameRule::Keep;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = DisplayNameRule::Replace(name.into());
        self
    }

    pub fn includes(&self, collection: C) -> bool {
        !self.excluded.contains(&collection)
    }

    pub fn display_name(&self) -> &DisplayNameRule {
        &self.display_name
    }

    /// Excluded collections, in declaration order.
    pub fn excluded(&self) -> Vec<C> {
        C::ALL
            .iter()
            .copied()
            .filter(|c| self.excluded.contains(c))
            .collect()
    }
}

impl<C: CollectionKind> Default for ClonePolicy<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// An aggregate that can be duplicated under a new business key.
pub trait Cloneable: Aggregate + Clone {
    type Collection: CollectionKind;

    fn set_business_key(&mut self, key: Self::BusinessKey);

    fn display_name_mut(&mut self) -> &mut Option<String>;

    /// Remove every row of one child collection.
    fn clear_collection(&mut self, collection: Self::Collection);

    /// Unassign every surrogate key and restart the lifecycle timestamps.
    fn reset_identity(&mut self, now: OffsetDateTime);
}

/// Build an unpersisted copy of `source` under `target_key`.
pub fn clone_aggregate<A: Cloneable>(
    source: &A,
    target_key: A::BusinessKey,
    policy: &ClonePolicy<A::Collection>,
    now: OffsetDateTime,
) -> A {
    let mut clone = source.clone();
    clone.set_business_key(target_key);
    clone.reset_identity(now);

    for &collection in <A::Collection as CollectionKind>::ALL {
        if !policy.includes(collection) {
            clone.clear_collection(collection);
        }
    }

    match policy.display_name() {
        DisplayNameRule::Reset => *clone.display_name_mut() = None,
        DisplayNameRule::Keep => {}
        DisplayNameRule::Replace(name) => *clone.display_name_mut() = Some(name.clone()),
    }

    clone
}

fn unassign<T>(rows: &mut [T], id: impl Fn(&mut T) -> &mut i64) {
    for row in rows {
        *id(row) = UNASSIGNED;
    }
}

impl Cloneable for Client {
    type Collection = ClientCollection;

    fn set_business_key(&mut self, key: String) {
        self.client_id = key;
    }

    fn display_name_mut(&mut self) -> &mut Option<String> {
        &mut self.client_name
    }

    fn clear_collection(&mut self, collection: ClientCollection) {
        match collection {
            ClientCollection::Secrets => self.secrets.clear(),
            ClientCollection::Claims => self.claims.clear(),
            ClientCollection::Properties => self.properties.clear(),
            ClientCollection::RedirectUris => self.redirect_uris.clear(),
            ClientCollection::PostLogoutRedirectUris => self.post_logout_redirect_uris.clear(),
            ClientCollection::AllowedScopes => self.allowed_scopes.clear(),
            ClientCollection::AllowedGrantTypes => self.allowed_grant_types.clear(),
            ClientCollection::AllowedCorsOrigins => self.allowed_cors_origins.clear(),
            ClientCollection::IdentityProviderRestrictions => {
                self.identity_provider_restrictions.clear()
            }
        }
    }

    fn reset_identity(&mut self, now: OffsetDateTime) {
        self.id = UNASSIGNED;
        self.created = now;
        self.updated = None;
        for secret in &mut self.secrets {
            secret.id = UNASSIGNED;
            secret.created = now;
        }
        unassign(&mut self.claims, |c| &mut c.id);
        unassign(&mut self.properties, |p| &mut p.id);
        unassign(&mut self.redirect_uris, |v| &mut v.id);
        unassign(&mut self.post_logout_redirect_uris, |v| &mut v.id);
        unassign(&mut self.allowed_scopes, |v| &mut v.id);
        unassign(&mut self.allowed_grant_types, |v| &mut v.id);
        unassign(&mut self.allowed_cors_origins, |v| &mut v.id);
        unassign(&mut self.identity_provider_restrictions, |v| &mut v.id);
    }
}

impl Cloneable for ApiResource {
    type Collection = ApiResourceCollection;

    fn set_business_key(&mut self, key: String) {
        self.name = key;
    }

    fn display_name_mut(&mut self) -> &mut Option<String> {
        &mut self.display_name
    }

    fn clear_collection(&mut self, collection: ApiResourceCollection) {
        match collection {
            ApiResourceCollection::Secrets => self.secrets.clear(),
            ApiResourceCollection::Properties => self.properties.clear(),
            ApiResourceCollection::UserClaims => self.user_claims.clear(),
            ApiResourceCollection::Scopes => self.scopes.clear(),
        }
    }

    fn reset_identity(&mut self, now: OffsetDateTime) {
        self.id = UNASSIGNED;
        self.created = now;
        self.updated = None;
        for secret in &mut self.secrets {
            secret.id = UNASSIGNED;
            secret.created = now;
        }
        unassign(&mut self.properties, |p| &mut p.id);
        unassign(&mut self.user_claims, |c| &mut c.id);
        unassign(&mut self.scopes, |v| &mut v.id);
    }
}

impl Cloneable for ApiScope {
    type Collection = ApiScopeCollection;

    fn set_business_key(&mut self, key: String) {
        self.name = key;
    }

    fn display_name_mut(&mut self) -> &mut Option<String> {
        &mut self.display_name
    }

    fn clear_collection(&mut self, collection: ApiScopeCollection) {
        match collection {
            ApiScopeCollection::Properties => self.properties.clear(),
            ApiScopeCollection::UserClaims => self.user_claims.clear(),
        }
    }

    // Scopes carry no lifecycle timestamps.
    fn reset_identity(&mut self, _now: OffsetDateTime) {
        self.id = UNASSIGNED;
        unassign(&mut self.properties, |p| &mut p.id);
        unassign(&mut self.user_claims, |c| &mut c.id);
    }
}

impl Cloneable for IdentityResource {
    type Collection = IdentityResourceCollection;

    fn set_business_key(&mut self, key: String) {
        self.name = key;
    }

    fn display_name_mut(&mut self) -> &mut Option<String> {
        &mut self.display_name
    }

    fn clear_collection(&mut self, collection: IdentityResourceCollection) {
        match collection {
            IdentityResourceCollection::Properties => self.properties.clear(),
            IdentityResourceCollection::UserClaims => self.user_claims.clear(),
        }
    }

    fn reset_identity(&mut self, now: OffsetDateTime) {
        self.id = UNASSIGNED;
        self.created = now;
        self.updated = None;
        unassign(&mut self.properties, |p| &mut p.id);
        unassign(&mut self.user_claims, |c| &mut c.id);
    }
}
