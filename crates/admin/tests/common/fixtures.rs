//! DTO fixtures.

use gatehouse_admin::dtos::{
    ApiResourceDto, ApiScopeDto, ClientClaimDto, ClientDto, IdentityResourceDto, PropertyDto,
    SecretDto,
};
use gatehouse_core::UNASSIGNED;
use gatehouse_metadata::models::PersistedGrant;
use time::OffsetDateTime;
use time::macros::datetime;

#[allow(dead_code)]
pub const FIXED_TIME: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

/// A client with a secret, a claim, a property and two scopes.
#[allow(dead_code)]
pub fn client_dto(client_id: &str) -> ClientDto {
    let mut dto = ClientDto::new(client_id);
    dto.client_name = Some(format!("{client_id} display"));
    dto.secrets = vec![SecretDto::new("s3cr3t-hash")];
    dto.claims = vec![ClientClaimDto::new("role", "admin")];
    dto.properties = vec![PropertyDto::new("tier", "gold")];
    dto.redirect_uris = vec!["https://app.example.com/callback".to_string()];
    dto.allowed_scopes = vec!["openid".to_string(), "profile".to_string()];
    dto.allowed_grant_types = vec!["authorization_code".to_string()];
    dto
}

#[allow(dead_code)]
pub fn api_resource_dto(name: &str) -> ApiResourceDto {
    let mut dto = ApiResourceDto::new(name);
    dto.display_name = Some(format!("{name} api"));
    dto.secrets = vec![SecretDto::new("api-secret")];
    dto.properties = vec![PropertyDto::new("owner", "payments")];
    dto.user_claims = vec!["email".to_string()];
    dto.scopes = vec![format!("{name}.read"), format!("{name}.write")];
    dto
}

#[allow(dead_code)]
pub fn api_scope_dto(name: &str) -> ApiScopeDto {
    let mut dto = ApiScopeDto::new(name);
    dto.display_name = Some(name.to_uppercase());
    dto.user_claims = vec!["role".to_string()];
    dto
}

#[allow(dead_code)]
pub fn identity_resource_dto(name: &str) -> IdentityResourceDto {
    let mut dto = IdentityResourceDto::new(name);
    dto.display_name = Some(format!("Your {name}"));
    dto.user_claims = vec!["name".to_string(), "family_name".to_string()];
    dto
}

#[allow(dead_code)]
pub fn grant(key: &str, subject_id: &str) -> PersistedGrant {
    PersistedGrant {
        id: UNASSIGNED,
        key: key.to_string(),
        grant_type: "refresh_token".to_string(),
        subject_id: Some(subject_id.to_string()),
        session_id: None,
        client_id: "web".to_string(),
        description: None,
        creation_time: FIXED_TIME,
        expiration: None,
        consumed_time: None,
        data: "{}".to_string(),
    }
}
