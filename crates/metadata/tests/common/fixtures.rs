//! Test fixtures for building aggregates.

use gatehouse_core::UNASSIGNED;
use gatehouse_metadata::models::{
    ApiResource, ApiScope, Client, ClientClaim, IdentityResource, PersistedGrant, Property,
    Secret, UserClaim, ValueRow,
};
use time::OffsetDateTime;
use time::macros::datetime;

/// Fixed timestamp so stored and loaded rows compare equal.
#[allow(dead_code)]
pub const FIXED_TIME: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

#[allow(dead_code)]
pub fn secret(value: &str) -> Secret {
    Secret {
        id: UNASSIGNED,
        secret_type: "SharedSecret".to_string(),
        value: value.to_string(),
        description: None,
        expiration: None,
        created: FIXED_TIME,
    }
}

#[allow(dead_code)]
pub fn property(key: &str, value: &str) -> Property {
    Property {
        id: UNASSIGNED,
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[allow(dead_code)]
pub fn user_claim(claim_type: &str) -> UserClaim {
    UserClaim {
        id: UNASSIGNED,
        claim_type: claim_type.to_string(),
    }
}

/// A client with one row in every child collection.
#[allow(dead_code)]
pub fn sample_client(client_id: &str) -> Client {
    let mut client = Client::new(client_id);
    client.client_name = Some(format!("{client_id} display"));
    client.created = FIXED_TIME;
    client.secrets = vec![secret("s3cr3t-hash")];
    client.claims = vec![ClientClaim {
        id: UNASSIGNED,
        claim_type: "role".to_string(),
        value: "admin".to_string(),
    }];
    client.properties = vec![property("tier", "gold")];
    client.redirect_uris = vec![ValueRow::new("https://app.example.com/callback")];
    client.post_logout_redirect_uris = vec![ValueRow::new("https://app.example.com/")];
    client.allowed_scopes = vec![ValueRow::new("openid"), ValueRow::new("profile")];
    client.allowed_grant_types = vec![ValueRow::new("authorization_code")];
    client.allowed_cors_origins = vec![ValueRow::new("https://app.example.com")];
    client.identity_provider_restrictions = vec![ValueRow::new("github")];
    client
}

#[allow(dead_code)]
pub fn sample_api_resource(name: &str) -> ApiResource {
    let mut resource = ApiResource::new(name);
    resource.display_name = Some(format!("{name} api"));
    resource.created = FIXED_TIME;
    resource.secrets = vec![secret("api-secret")];
    resource.properties = vec![property("owner", "payments")];
    resource.user_claims = vec![user_claim("email")];
    resource.scopes = vec![ValueRow::new(format!("{name}.read"))];
    resource
}

#[allow(dead_code)]
pub fn sample_api_scope(name: &str) -> ApiScope {
    let mut scope = ApiScope::new(name);
    scope.display_name = Some(name.to_uppercase());
    scope.properties = vec![property("audience", "internal")];
    scope.user_claims = vec![user_claim("role")];
    scope
}

#[allow(dead_code)]
pub fn sample_identity_resource(name: &str) -> IdentityResource {
    let mut resource = IdentityResource::new(name);
    resource.display_name = Some(format!("Your {name}"));
    resource.created = FIXED_TIME;
    resource.properties = vec![property("category", "standard")];
    resource.user_claims = vec![user_claim("name"), user_claim("family_name")];
    resource
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

/// Clear surrogate keys so aggregates can be compared by content.
#[allow(dead_code)]
pub fn without_ids(mut client: Client) -> Client {
    client.id = UNASSIGNED;
    client.secrets.iter_mut().for_each(|r| r.id = UNASSIGNED);
    client.claims.iter_mut().for_each(|r| r.id = UNASSIGNED);
    client.properties.iter_mut().for_each(|r| r.id = UNASSIGNED);
    for kind in gatehouse_metadata::models::ClientValueKind::ALL {
        client.values_mut(kind).iter_mut().for_each(|r| r.id = UNASSIGNED);
    }
    client
}
