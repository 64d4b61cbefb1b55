//! Database models mapping to the configuration and operational schema.
//!
//! Root rows carry their child collections as `#[sqlx(skip)]` vectors; the
//! store fills them in when an aggregate is loaded by id. Child rows do not
//! carry their parent key: the link is established when they are inserted
//! under a parent inside a unit of work.

use gatehouse_core::{Aggregate, SurrogateKey, UNASSIGNED};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use time::OffsetDateTime;

// =============================================================================
// Child rows
// =============================================================================

/// Shared secret attached to a client or API resource.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Secret {
    pub id: SurrogateKey,
    pub secret_type: String,
    pub value: String,
    pub description: Option<String>,
    pub expiration: Option<OffsetDateTime>,
    pub created: OffsetDateTime,
}

/// Claim issued for a client.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ClientClaim {
    pub id: SurrogateKey,
    pub claim_type: String,
    pub value: String,
}

/// Free-form key/value property.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Property {
    pub id: SurrogateKey,
    pub key: String,
    pub value: String,
}

/// User claim type requested by a resource or scope.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserClaim {
    pub id: SurrogateKey,
    pub claim_type: String,
}

/// Single-value child row (redirect uri, scope name, grant type, ...).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ValueRow {
    pub id: SurrogateKey,
    pub value: String,
}

impl ValueRow {
    /// A row that has not been persisted yet.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            value: value.into(),
        }
    }
}

/// A child row together with the surrogate key of the root that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Owned<T> {
    pub parent_id: SurrogateKey,
    pub item: T,
}

impl<'r, T> FromRow<'r, SqliteRow> for Owned<T>
where
    T: FromRow<'r, SqliteRow>,
{
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            parent_id: row.try_get("parent_id")?,
            item: T::from_row(row)?,
        })
    }
}

// =============================================================================
// Clients
// =============================================================================

/// The single-value collections of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientValueKind {
    RedirectUri,
    PostLogoutRedirectUri,
    AllowedScope,
    AllowedGrantType,
    AllowedCorsOrigin,
    IdentityProviderRestriction,
}

impl ClientValueKind {
    pub const ALL: [ClientValueKind; 6] = [
        ClientValueKind::RedirectUri,
        ClientValueKind::PostLogoutRedirectUri,
        ClientValueKind::AllowedScope,
        ClientValueKind::AllowedGrantType,
        ClientValueKind::AllowedCorsOrigin,
        ClientValueKind::IdentityProviderRestriction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClientValueKind::RedirectUri => "redirect_uri",
            ClientValueKind::PostLogoutRedirectUri => "post_logout_redirect_uri",
            ClientValueKind::AllowedScope => "allowed_scope",
            ClientValueKind::AllowedGrantType => "allowed_grant_type",
            ClientValueKind::AllowedCorsOrigin => "allowed_cors_origin",
            ClientValueKind::IdentityProviderRestriction => "identity_provider_restriction",
        }
    }
}

impl std::fmt::Display for ClientValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth2/OIDC client registration.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Client {
    pub id: SurrogateKey,
    /// Business key, unique across the store.
    pub client_id: String,
    pub client_name: Option<String>,
    pub description: Option<String>,
    pub client_uri: Option<String>,
    pub logo_uri: Option<String>,
    pub protocol_type: String,
    pub enabled: bool,
    pub require_client_secret: bool,
    pub require_consent: bool,
    pub require_pkce: bool,
    pub allow_offline_access: bool,
    pub access_token_lifetime: i32,
    pub identity_token_lifetime: i32,
    pub absolute_refresh_token_lifetime: i32,
    pub non_editable: bool,
    pub created: OffsetDateTime,
    pub updated: Option<OffsetDateTime>,
    #[sqlx(skip)]
    pub secrets: Vec<Secret>,
    #[sqlx(skip)]
    pub claims: Vec<ClientClaim>,
    #[sqlx(skip)]
    pub properties: Vec<Property>,
    #[sqlx(skip)]
    pub redirect_uris: Vec<ValueRow>,
    #[sqlx(skip)]
    pub post_logout_redirect_uris: Vec<ValueRow>,
    #[sqlx(skip)]
    pub allowed_scopes: Vec<ValueRow>,
    #[sqlx(skip)]
    pub allowed_grant_types: Vec<ValueRow>,
    #[sqlx(skip)]
    pub allowed_cors_origins: Vec<ValueRow>,
    #[sqlx(skip)]
    pub identity_provider_restrictions: Vec<ValueRow>,
}

impl Client {
    /// A new, unpersisted client with the usual defaults.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            client_id: client_id.into(),
            client_name: None,
            description: None,
            client_uri: None,
            logo_uri: None,
            protocol_type: "oidc".to_string(),
            enabled: true,
            require_client_secret: true,
            require_consent: false,
            require_pkce: true,
            allow_offline_access: false,
            access_token_lifetime: 3600,
            identity_token_lifetime: 300,
            absolute_refresh_token_lifetime: 2_592_000,
            non_editable: false,
            created: OffsetDateTime::now_utc(),
            updated: None,
            secrets: Vec::new(),
            claims: Vec::new(),
            properties: Vec::new(),
            redirect_uris: Vec::new(),
            post_logout_redirect_uris: Vec::new(),
            allowed_scopes: Vec::new(),
            allowed_grant_types: Vec::new(),
            allowed_cors_origins: Vec::new(),
            identity_provider_restrictions: Vec::new(),
        }
    }

    pub fn values(&self, kind: ClientValueKind) -> &Vec<ValueRow> {
        match kind {
            ClientValueKind::RedirectUri => &self.redirect_uris,
            ClientValueKind::PostLogoutRedirectUri => &self.post_logout_redirect_uris,
            ClientValueKind::AllowedScope => &self.allowed_scopes,
            ClientValueKind::AllowedGrantType => &self.allowed_grant_types,
            ClientValueKind::AllowedCorsOrigin => &self.allowed_cors_origins,
            ClientValueKind::IdentityProviderRestriction => &self.identity_provider_restrictions,
        }
    }

    pub fn values_mut(&mut self, kind: ClientValueKind) -> &mut Vec<ValueRow> {
        match kind {
            ClientValueKind::RedirectUri => &mut self.redirect_uris,
            ClientValueKind::PostLogoutRedirectUri => &mut self.post_logout_redirect_uris,
            ClientValueKind::AllowedScope => &mut self.allowed_scopes,
            ClientValueKind::AllowedGrantType => &mut self.allowed_grant_types,
            ClientValueKind::AllowedCorsOrigin => &mut self.allowed_cors_origins,
            ClientValueKind::IdentityProviderRestriction => {
                &mut self.identity_provider_restrictions
            }
        }
    }
}

impl Aggregate for Client {
    type BusinessKey = String;
    const KIND: &'static str = "client";

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn business_key(&self) -> &String {
        &self.client_id
    }
}

// =============================================================================
// Resources
// =============================================================================

/// Protected API.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ApiResource {
    pub id: SurrogateKey,
    /// Business key, unique across API resources.
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub show_in_discovery_document: bool,
    pub require_resource_indicator: bool,
    pub non_editable: bool,
    pub created: OffsetDateTime,
    pub updated: Option<OffsetDateTime>,
    #[sqlx(skip)]
    pub secrets: Vec<Secret>,
    #[sqlx(skip)]
    pub properties: Vec<Property>,
    #[sqlx(skip)]
    pub user_claims: Vec<UserClaim>,
    #[sqlx(skip)]
    pub scopes: Vec<ValueRow>,
}

impl ApiResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            name: name.into(),
            display_name: None,
            description: None,
            enabled: true,
            show_in_discovery_document: true,
            require_resource_indicator: false,
            non_editable: false,
            created: OffsetDateTime::now_utc(),
            updated: None,
            secrets: Vec::new(),
            properties: Vec::new(),
            user_claims: Vec::new(),
            scopes: Vec::new(),
        }
    }
}

impl Aggregate for ApiResource {
    type BusinessKey = String;
    const KIND: &'static str = "api resource";

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn business_key(&self) -> &String {
        &self.name
    }
}

/// Scope exposed by one or more API resources.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ApiScope {
    pub id: SurrogateKey,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub required: bool,
    pub emphasize: bool,
    pub show_in_discovery_document: bool,
    #[sqlx(skip)]
    pub properties: Vec<Property>,
    #[sqlx(skip)]
    pub user_claims: Vec<UserClaim>,
}

impl ApiScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            name: name.into(),
            display_name: None,
            description: None,
            enabled: true,
            required: false,
            emphasize: false,
            show_in_discovery_document: true,
            properties: Vec::new(),
            user_claims: Vec::new(),
        }
    }
}

impl Aggregate for ApiScope {
    type BusinessKey = String;
    const KIND: &'static str = "api scope";

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn business_key(&self) -> &String {
        &self.name
    }
}

/// Group of identity claims (openid, profile, email, ...).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct IdentityResource {
    pub id: SurrogateKey,
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    pub required: bool,
    pub emphasize: bool,
    pub show_in_discovery_document: bool,
    pub non_editable: bool,
    pub created: OffsetDateTime,
    pub updated: Option<OffsetDateTime>,
    #[sqlx(skip)]
    pub properties: Vec<Property>,
    #[sqlx(skip)]
    pub user_claims: Vec<UserClaim>,
}

impl IdentityResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            name: name.into(),
            display_name: None,
            description: None,
            enabled: true,
            required: false,
            emphasize: false,
            show_in_discovery_document: true,
            non_editable: false,
            created: OffsetDateTime::now_utc(),
            updated: None,
            properties: Vec::new(),
            user_claims: Vec::new(),
        }
    }
}

impl Aggregate for IdentityResource {
    type BusinessKey = String;
    const KIND: &'static str = "identity resource";

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn business_key(&self) -> &String {
        &self.name
    }
}

// =============================================================================
// Operational data
// =============================================================================

/// Grant persisted by the token service (codes, refresh tokens, consent).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PersistedGrant {
    pub id: SurrogateKey,
    /// Opaque handle, unique across grants.
    pub key: String,
    pub grant_type: String,
    pub subject_id: Option<String>,
    pub session_id: Option<String>,
    pub client_id: String,
    pub description: Option<String>,
    pub creation_time: OffsetDateTime,
    pub expiration: Option<OffsetDateTime>,
    pub consumed_time: Option<OffsetDateTime>,
    pub data: String,
}

impl Aggregate for PersistedGrant {
    type BusinessKey = String;
    const KIND: &'static str = "persisted grant";

    fn id(&self) -> SurrogateKey {
        self.id
    }

    fn business_key(&self) -> &String {
        &self.key
    }
}
