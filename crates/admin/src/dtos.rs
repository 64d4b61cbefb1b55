//! Data transfer objects exchanged with service callers.
//!
//! DTOs flatten single-value child collections into plain string lists and
//! never serialize secret values.

use crate::error::{AdminError, AdminResult};
use gatehouse_core::aggregate::{is_assigned, validate_key};
use gatehouse_core::{SurrogateKey, UNASSIGNED};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

fn default_true() -> bool {
    true
}

fn default_protocol_type() -> String {
    "oidc".to_string()
}

fn default_secret_type() -> String {
    "SharedSecret".to_string()
}

fn default_access_token_lifetime() -> i32 {
    3600
}

fn default_identity_token_lifetime() -> i32 {
    300
}

fn default_absolute_refresh_token_lifetime() -> i32 {
    2_592_000
}

fn require_values(field: &str, values: &[String]) -> AdminResult<()> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(AdminError::Validation(format!(
            "{field} must not contain empty values"
        )));
    }
    Ok(())
}

fn validate_properties(properties: &[PropertyDto]) -> AdminResult<()> {
    properties.iter().try_for_each(PropertyDto::validate)
}

// =============================================================================
// Child DTOs
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecretDto {
    #[serde(default)]
    pub id: SurrogateKey,
    #[serde(default = "default_secret_type")]
    pub secret_type: String,
    /// Stored (already hashed) secret value. Never serialized.
    #[serde(default, skip_serializing)]
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expiration: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
}

impl SecretDto {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            secret_type: default_secret_type(),
            value: value.into(),
            description: None,
            expiration: None,
            created: None,
        }
    }

    /// Stored secrets come back without their value, so only new ones must
    /// carry it.
    pub fn validate(&self) -> AdminResult<()> {
        validate_key("secret type", &self.secret_type)?;
        if !is_assigned(self.id) {
            validate_key("secret value", &self.value)?;
        }
        Ok(())
    }

    /// Validation for a secret added on its own, whatever its id.
    pub fn validate_new(&self) -> AdminResult<()> {
        validate_key("secret type", &self.secret_type)?;
        validate_key("secret value", &self.value)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientClaimDto {
    #[serde(default)]
    pub id: SurrogateKey,
    pub claim_type: String,
    pub value: String,
}

impl ClientClaimDto {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }

    pub fn validate(&self) -> AdminResult<()> {
        validate_key("claim type", &self.claim_type)?;
        validate_key("claim value", &self.value)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDto {
    #[serde(default)]
    pub id: SurrogateKey,
    pub key: String,
    pub value: String,
}

impl PropertyDto {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn validate(&self) -> AdminResult<()> {
        validate_key("property key", &self.key)?;
        validate_key("property value", &self.value)?;
        Ok(())
    }
}

/// Entry of a single-value collection (redirect uri, cors origin, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDto {
    pub id: SurrogateKey,
    pub value: String,
}

/// A sub-entity together with the aggregate that owns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OwnedDto<T> {
    pub parent_id: SurrogateKey,
    pub parent_key: String,
    #[serde(flatten)]
    pub item: T,
}

// =============================================================================
// Clients
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientDto {
    #[serde(default)]
    pub id: SurrogateKey,
    pub client_id: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_uri: Option<String>,
    #[serde(default)]
    pub logo_uri: Option<String>,
    #[serde(default = "default_protocol_type")]
    pub protocol_type: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub require_client_secret: bool,
    #[serde(default)]
    pub require_consent: bool,
    #[serde(default = "default_true")]
    pub require_pkce: bool,
    #[serde(default)]
    pub allow_offline_access: bool,
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: i32,
    #[serde(default = "default_identity_token_lifetime")]
    pub identity_token_lifetime: i32,
    #[serde(default = "default_absolute_refresh_token_lifetime")]
    pub absolute_refresh_token_lifetime: i32,
    #[serde(default)]
    pub non_editable: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated: Option<OffsetDateTime>,
    #[serde(default)]
    pub secrets: Vec<SecretDto>,
    #[serde(default)]
    pub claims: Vec<ClientClaimDto>,
    #[serde(default)]
    pub properties: Vec<PropertyDto>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub post_logout_redirect_uris: Vec<String>,
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    #[serde(default)]
    pub allowed_grant_types: Vec<String>,
    #[serde(default)]
    pub allowed_cors_origins: Vec<String>,
    #[serde(default)]
    pub identity_provider_restrictions: Vec<String>,
}

impl ClientDto {
    /// A client with default settings and no children.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            id: UNASSIGNED,
            client_id: client_id.into(),
            client_name: None,
            description: None,
            client_uri: None,
            logo_uri: None,
            protocol_type: default_protocol_type(),
            enabled: true,
            require_client_secret: true,
            require_consent: false,
            require_pkce: true,
            allow_offline_access: false,
            access_token_lifetime: default_access_token_lifetime(),
            identity_token_lifetime: default_identity_token_lifetime(),
            absolute_refresh_token_lifetime: default_absolute_refresh_token_lifetime(),
            non_editable: false,
            created: None,
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

    pub fn validate(&self) -> AdminResult<()> {
        validate_key("client_id", &self.client_id)?;
        validate_key("protocol_type", &self.protocol_type)?;
        self.secrets.iter().try_for_each(SecretDto::validate)?;
        self.claims.iter().try_for_each(ClientClaimDto::validate)?;
        validate_properties(&self.properties)?;
        require_values("redirect_uris", &self.redirect_uris)?;
        require_values("post_logout_redirect_uris", &self.post_logout_redirect_uris)?;
        require_values("allowed_scopes", &self.allowed_scopes)?;
        require_values("allowed_grant_types", &self.allowed_grant_types)?;
        require_values("allowed_cors_origins", &self.allowed_cors_origins)?;
        require_values(
            "identity_provider_restrictions",
            &self.identity_provider_restrictions,
        )?;
        Ok(())
    }
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResourceDto {
    #[serde(default)]
    pub id: SurrogateKey,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub show_in_discovery_document: bool,
    #[serde(default)]
    pub require_resource_indicator: bool,
    #[serde(default)]
    pub non_editable: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated: Option<OffsetDateTime>,
    #[serde(default)]
    pub secrets: Vec<SecretDto>,
    #[serde(default)]
    pub properties: Vec<PropertyDto>,
    #[serde(default)]
    pub user_claims: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl ApiResourceDto {
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
            created: None,
            updated: None,
            secrets: Vec::new(),
            properties: Vec::new(),
            user_claims: Vec::new(),
            scopes: Vec::new(),
        }
    }

    pub fn validate(&self) -> AdminResult<()> {
        validate_key("name", &self.name)?;
        self.secrets.iter().try_for_each(SecretDto::validate)?;
        validate_properties(&self.properties)?;
        require_values("user_claims", &self.user_claims)?;
        require_values("scopes", &self.scopes)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiScopeDto {
    #[serde(default)]
    pub id: SurrogateKey,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub emphasize: bool,
    #[serde(default = "default_true")]
    pub show_in_discovery_document: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDto>,
    #[serde(default)]
    pub user_claims: Vec<String>,
}

impl ApiScopeDto {
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

    pub fn validate(&self) -> AdminResult<()> {
        validate_key("name", &self.name)?;
        validate_properties(&self.properties)?;
        require_values("user_claims", &self.user_claims)?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityResourceDto {
    #[serde(default)]
    pub id: SurrogateKey,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub emphasize: bool,
    #[serde(default = "default_true")]
    pub show_in_discovery_document: bool,
    #[serde(default)]
    pub non_editable: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated: Option<OffsetDateTime>,
    #[serde(default)]
    pub properties: Vec<PropertyDto>,
    #[serde(default)]
    pub user_claims: Vec<String>,
}

impl IdentityResourceDto {
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
            created: None,
            updated: None,
            properties: Vec::new(),
            user_claims: Vec::new(),
        }
    }

    pub fn validate(&self) -> AdminResult<()> {
        validate_key("name", &self.name)?;
        validate_properties(&self.properties)?;
        require_values("user_claims", &self.user_claims)?;
        Ok(())
    }
}

// =============================================================================
// Operational data
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedGrantDto {
    pub key: String,
    pub grant_type: String,
    pub subject_id: Option<String>,
    pub session_id: Option<String>,
    pub client_id: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expiration: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub consumed_time: Option<OffsetDateTime>,
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_dto_defaults_from_json() {
        let dto: ClientDto = serde_json::from_str(r#"{"client_id":"web"}"#).unwrap();
        assert_eq!(dto, ClientDto::new("web"));
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_values() {
        assert!(matches!(
            ClientDto::new(" ").validate(),
            Err(AdminError::Validation(_))
        ));

        let mut dto = ClientDto::new("web");
        dto.allowed_cors_origins.push(String::new());
        assert!(dto.validate().is_err());

        let mut dto = ApiScopeDto::new("orders.read");
        dto.properties.push(PropertyDto::new("", "x"));
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_stored_secret_may_omit_value() {
        let mut secret = SecretDto::new("");
        assert!(secret.validate().is_err());
        secret.id = 4;
        assert!(secret.validate().is_ok());
        assert!(secret.validate_new().is_err());
    }

    #[test]
    fn test_secret_value_is_never_serialized() {
        let json = serde_json::to_value(SecretDto::new("hashed")).unwrap();
        assert!(json.get("value").is_none());
        assert_eq!(json["secret_type"], "SharedSecret");
    }
}
