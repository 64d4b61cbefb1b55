//! Conversions between storage entities and DTOs.
//!
//! All conversions are plain functions. Timestamps that a DTO leaves unset
//! are filled from the `now` argument so the functions stay deterministic.

use crate::dtos::{
    ApiResourceDto, ApiScopeDto, ClientClaimDto, ClientDto, IdentityResourceDto, OwnedDto,
    PersistedGrantDto, PropertyDto, SecretDto, ValueDto,
};
use crate::error::{AdminError, AdminResult};
use gatehouse_core::aggregate::is_assigned;
use gatehouse_core::{SurrogateKey, UNASSIGNED};
use gatehouse_metadata::models::{
    ApiResource, ApiScope, Client, ClientClaim, ClientValueKind, IdentityResource, Owned,
    PersistedGrant, Property, Secret, UserClaim, ValueRow,
};
use std::collections::HashSet;
use time::OffsetDateTime;

// =============================================================================
// Child rows
// =============================================================================

pub fn secret_to_dto(secret: &Secret) -> SecretDto {
    SecretDto {
        id: secret.id,
        secret_type: secret.secret_type.clone(),
        value: secret.value.clone(),
        description: secret.description.clone(),
        expiration: secret.expiration,
        created: Some(secret.created),
    }
}

pub fn secret_from_dto(dto: &SecretDto, now: OffsetDateTime) -> Secret {
    Secret {
        id: dto.id,
        secret_type: dto.secret_type.clone(),
        value: dto.value.clone(),
        description: dto.description.clone(),
        expiration: dto.expiration,
        created: dto.created.unwrap_or(now),
    }
}

pub fn client_claim_to_dto(claim: &ClientClaim) -> ClientClaimDto {
    ClientClaimDto {
        id: claim.id,
        claim_type: claim.claim_type.clone(),
        value: claim.value.clone(),
    }
}

pub fn client_claim_from_dto(dto: &ClientClaimDto) -> ClientClaim {
    ClientClaim {
        id: dto.id,
        claim_type: dto.claim_type.clone(),
        value: dto.value.clone(),
    }
}

pub fn property_to_dto(property: &Property) -> PropertyDto {
    PropertyDto {
        id: property.id,
        key: property.key.clone(),
        value: property.value.clone(),
    }
}

pub fn property_from_dto(dto: &PropertyDto) -> Property {
    Property {
        id: dto.id,
        key: dto.key.clone(),
        value: dto.value.clone(),
    }
}

pub fn value_to_dto(row: &ValueRow) -> ValueDto {
    ValueDto {
        id: row.id,
        value: row.value.clone(),
    }
}

pub fn owned_to_dto<T, D>(
    owned: &Owned<T>,
    parent_key: impl Into<String>,
    convert: impl FnOnce(&T) -> D,
) -> OwnedDto<D> {
    OwnedDto {
        parent_id: owned.parent_id,
        parent_key: parent_key.into(),
        item: convert(&owned.item),
    }
}

fn values_to_strings(rows: &[ValueRow]) -> Vec<String> {
    rows.iter().map(|r| r.value.clone()).collect()
}

fn values_from_strings(values: &[String]) -> Vec<ValueRow> {
    values.iter().map(ValueRow::new).collect()
}

fn claims_to_strings(claims: &[UserClaim]) -> Vec<String> {
    claims.iter().map(|c| c.claim_type.clone()).collect()
}

fn claims_from_strings(claims: &[String]) -> Vec<UserClaim> {
    claims
        .iter()
        .map(|claim_type| UserClaim {
            id: UNASSIGNED,
            claim_type: claim_type.clone(),
        })
        .collect()
}

// =============================================================================
// Id adoption
// =============================================================================

/// Child rows that DTOs carry without an id.
pub trait Adoptable {
    fn row_id(&self) -> SurrogateKey;
    fn set_row_id(&mut self, id: SurrogateKey);
    /// Value compared when matching a submitted row against a stored one.
    fn match_value(&self) -> &str;
}

impl Adoptable for ValueRow {
    fn row_id(&self) -> SurrogateKey {
        self.id
    }

    fn set_row_id(&mut self, id: SurrogateKey) {
        self.id = id;
    }

    fn match_value(&self) -> &str {
        &self.value
    }
}

impl Adoptable for UserClaim {
    fn row_id(&self) -> SurrogateKey {
        self.id
    }

    fn set_row_id(&mut self, id: SurrogateKey) {
        self.id = id;
    }

    fn match_value(&self) -> &str {
        &self.claim_type
    }
}

/// Give rows without an id the id of a stored row with the same value, so an
/// update that resubmits an unchanged list keeps the stored rows. Each stored
/// row is adopted at most once.
pub fn adopt_ids<T: Adoptable>(rows: &mut [T], stored: &[T]) {
    let mut claimed: HashSet<SurrogateKey> = rows
        .iter()
        .map(Adoptable::row_id)
        .filter(|id| is_assigned(*id))
        .collect();

    for row in rows.iter_mut().filter(|r| !is_assigned(r.row_id())) {
        let found = stored
            .iter()
            .find(|s| !claimed.contains(&s.row_id()) && s.match_value() == row.match_value())
            .map(Adoptable::row_id);
        if let Some(id) = found {
            claimed.insert(id);
            row.set_row_id(id);
        }
    }
}

// =============================================================================
// Clients
// =============================================================================

pub fn client_to_dto(client: &Client) -> ClientDto {
    ClientDto {
        id: client.id,
        client_id: client.client_id.clone(),
        client_name: client.client_name.clone(),
        description: client.description.clone(),
        client_uri: client.client_uri.clone(),
        logo_uri: client.logo_uri.clone(),
        protocol_type: client.protocol_type.clone(),
        enabled: client.enabled,
        require_client_secret: client.require_client_secret,
        require_consent: client.require_consent,
        require_pkce: client.require_pkce,
        allow_offline_access: client.allow_offline_access,
        access_token_lifetime: client.access_token_lifetime,
        identity_token_lifetime: client.identity_token_lifetime,
        absolute_refresh_token_lifetime: client.absolute_refresh_token_lifetime,
        non_editable: client.non_editable,
        created: Some(client.created),
        updated: client.updated,
        secrets: client.secrets.iter().map(secret_to_dto).collect(),
        claims: client.claims.iter().map(client_claim_to_dto).collect(),
        properties: client.properties.iter().map(property_to_dto).collect(),
        redirect_uris: values_to_strings(&client.redirect_uris),
        post_logout_redirect_uris: values_to_strings(&client.post_logout_redirect_uris),
        allowed_scopes: values_to_strings(&client.allowed_scopes),
        allowed_grant_types: values_to_strings(&client.allowed_grant_types),
        allowed_cors_origins: values_to_strings(&client.allowed_cors_origins),
        identity_provider_restrictions: values_to_strings(&client.identity_provider_restrictions),
    }
}

pub fn client_from_dto(dto: &ClientDto, now: OffsetDateTime) -> Client {
    Client {
        id: dto.id,
        client_id: dto.client_id.clone(),
        client_name: dto.client_name.clone(),
        description: dto.description.clone(),
        client_uri: dto.client_uri.clone(),
        logo_uri: dto.logo_uri.clone(),
        protocol_type: dto.protocol_type.clone(),
        enabled: dto.enabled,
        require_client_secret: dto.require_client_secret,
        require_consent: dto.require_consent,
        require_pkce: dto.require_pkce,
        allow_offline_access: dto.allow_offline_access,
        access_token_lifetime: dto.access_token_lifetime,
        identity_token_lifetime: dto.identity_token_lifetime,
        absolute_refresh_token_lifetime: dto.absolute_refresh_token_lifetime,
        non_editable: dto.non_editable,
        created: dto.created.unwrap_or(now),
        updated: dto.updated,
        secrets: dto.secrets.iter().map(|s| secret_from_dto(s, now)).collect(),
        claims: dto.claims.iter().map(client_claim_from_dto).collect(),
        properties: dto.properties.iter().map(property_from_dto).collect(),
        redirect_uris: values_from_strings(&dto.redirect_uris),
        post_logout_redirect_uris: values_from_strings(&dto.post_logout_redirect_uris),
        allowed_scopes: values_from_strings(&dto.allowed_scopes),
        allowed_grant_types: values_from_strings(&dto.allowed_grant_types),
        allowed_cors_origins: values_from_strings(&dto.allowed_cors_origins),
        identity_provider_restrictions: values_from_strings(&dto.identity_provider_restrictions),
    }
}

/// Give retained secrets sent without a value their stored value.
fn adopt_secret_values(secrets: &mut [Secret], stored: &[Secret]) {
    for secret in secrets
        .iter_mut()
        .filter(|s| is_assigned(s.id) && s.value.is_empty())
    {
        if let Some(existing) = stored.iter().find(|s| s.id == secret.id) {
            secret.value = existing.value.clone();
        }
    }
}

/// Reject secrets that still have no value, such as a retained secret whose
/// id is not one of the stored ones.
pub fn require_secret_values(secrets: &[Secret]) -> AdminResult<()> {
    if secrets.iter().any(|s| s.value.trim().is_empty()) {
        return Err(AdminError::Validation(
            "secret value must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Keep the stored rows of every string list the update did not change, and
/// the stored value of every retained secret.
pub fn adopt_client_ids(client: &mut Client, stored: &Client) {
    for kind in ClientValueKind::ALL {
        adopt_ids(client.values_mut(kind), stored.values(kind));
    }
    adopt_secret_values(&mut client.secrets, &stored.secrets);
}

// =============================================================================
// Resources
// =============================================================================

pub fn api_resource_to_dto(resource: &ApiResource) -> ApiResourceDto {
    ApiResourceDto {
        id: resource.id,
        name: resource.name.clone(),
        display_name: resource.display_name.clone(),
        description: resource.description.clone(),
        enabled: resource.enabled,
        show_in_discovery_document: resource.show_in_discovery_document,
        require_resource_indicator: resource.require_resource_indicator,
        non_editable: resource.non_editable,
        created: Some(resource.created),
        updated: resource.updated,
        secrets: resource.secrets.iter().map(secret_to_dto).collect(),
        properties: resource.properties.iter().map(property_to_dto).collect(),
        user_claims: claims_to_strings(&resource.user_claims),
        scopes: values_to_strings(&resource.scopes),
    }
}

pub fn api_resource_from_dto(dto: &ApiResourceDto, now: OffsetDateTime) -> ApiResource {
    ApiResource {
        id: dto.id,
        name: dto.name.clone(),
        display_name: dto.display_name.clone(),
        description: dto.description.clone(),
        enabled: dto.enabled,
        show_in_discovery_document: dto.show_in_discovery_document,
        require_resource_indicator: dto.require_resource_indicator,
        non_editable: dto.non_editable,
        created: dto.created.unwrap_or(now),
        updated: dto.updated,
        secrets: dto.secrets.iter().map(|s| secret_from_dto(s, now)).collect(),
        properties: dto.properties.iter().map(property_from_dto).collect(),
        user_claims: claims_from_strings(&dto.user_claims),
        scopes: values_from_strings(&dto.scopes),
    }
}

pub fn adopt_api_resource_ids(resource: &mut ApiResource, stored: &ApiResource) {
    adopt_ids(&mut resource.user_claims, &stored.user_claims);
    adopt_ids(&mut resource.scopes, &stored.scopes);
    adopt_secret_values(&mut resource.secrets, &stored.secrets);
}

pub fn api_scope_to_dto(scope: &ApiScope) -> ApiScopeDto {
    ApiScopeDto {
        id: scope.id,
        name: scope.name.clone(),
        display_name: scope.display_name.clone(),
        description: scope.description.clone(),
        enabled: scope.enabled,
        required: scope.required,
        emphasize: scope.emphasize,
        show_in_discovery_document: scope.show_in_discovery_document,
        properties: scope.properties.iter().map(property_to_dto).collect(),
        user_claims: claims_to_strings(&scope.user_claims),
    }
}

pub fn api_scope_from_dto(dto: &ApiScopeDto) -> ApiScope {
    ApiScope {
        id: dto.id,
        name: dto.name.clone(),
        display_name: dto.display_name.clone(),
        description: dto.description.clone(),
        enabled: dto.enabled,
        required: dto.required,
        emphasize: dto.emphasize,
        show_in_discovery_document: dto.show_in_discovery_document,
        properties: dto.properties.iter().map(property_from_dto).collect(),
        user_claims: claims_from_strings(&dto.user_claims),
    }
}

pub fn adopt_api_scope_ids(scope: &mut ApiScope, stored: &ApiScope) {
    adopt_ids(&mut scope.user_claims, &stored.user_claims);
}

pub fn identity_resource_to_dto(resource: &IdentityResource) -> IdentityResourceDto {
    IdentityResourceDto {
        id: resource.id,
        name: resource.name.clone(),
        display_name: resource.display_name.clone(),
        description: resource.description.clone(),
        enabled: resource.enabled,
        required: resource.required,
        emphasize: resource.emphasize,
        show_in_discovery_document: resource.show_in_discovery_document,
        non_editable: resource.non_editable,
        created: Some(resource.created),
        updated: resource.updated,
        properties: resource.properties.iter().map(property_to_dto).collect(),
        user_claims: claims_to_strings(&resource.user_claims),
    }
}

pub fn identity_resource_from_dto(
    dto: &IdentityResourceDto,
    now: OffsetDateTime,
) -> IdentityResource {
    IdentityResource {
        id: dto.id,
        name: dto.name.clone(),
        display_name: dto.display_name.clone(),
        description: dto.description.clone(),
        enabled: dto.enabled,
        required: dto.required,
        emphasize: dto.emphasize,
        show_in_discovery_document: dto.show_in_discovery_document,
        non_editable: dto.non_editable,
        created: dto.created.unwrap_or(now),
        updated: dto.updated,
        properties: dto.properties.iter().map(property_from_dto).collect(),
        user_claims: claims_from_strings(&dto.user_claims),
    }
}

pub fn adopt_identity_resource_ids(resource: &mut IdentityResource, stored: &IdentityResource) {
    adopt_ids(&mut resource.user_claims, &stored.user_claims);
}

// =============================================================================
// Operational data
// =============================================================================

pub fn persisted_grant_to_dto(grant: &PersistedGrant) -> PersistedGrantDto {
    PersistedGrantDto {
        key: grant.key.clone(),
        grant_type: grant.grant_type.clone(),
        subject_id: grant.subject_id.clone(),
        session_id: grant.session_id.clone(),
        client_id: grant.client_id.clone(),
        description: grant.description.clone(),
        creation_time: grant.creation_time,
        expiration: grant.expiration,
        consumed_time: grant.consumed_time,
        data: grant.data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-01 08:30 UTC);

    #[test]
    fn test_client_mapping_preserves_fields() {
        let mut dto = ClientDto::new("web");
        dto.client_name = Some("Web".to_string());
        dto.allowed_scopes = vec!["openid".to_string(), "profile".to_string()];
        dto.properties = vec![PropertyDto::new("tier", "gold")];
        dto.secrets = vec![SecretDto::new("hash")];

        let entity = client_from_dto(&dto, NOW);
        assert_eq!(entity.created, NOW);
        assert_eq!(entity.allowed_scopes.len(), 2);
        assert!(entity.allowed_scopes.iter().all(|r| r.id == UNASSIGNED));
        assert_eq!(entity.secrets[0].created, NOW);

        let back = client_to_dto(&entity);
        assert_eq!(back.allowed_scopes, dto.allowed_scopes);
        assert_eq!(back.properties, dto.properties);
        assert_eq!(back.created, Some(NOW));
    }

    #[test]
    fn test_adopt_ids_matches_each_stored_row_once() {
        let stored = vec![
            ValueRow {
                id: 10,
                value: "openid".to_string(),
            },
            ValueRow {
                id: 11,
                value: "profile".to_string(),
            },
        ];
        let mut rows = vec![
            ValueRow::new("profile"),
            ValueRow::new("email"),
            ValueRow::new("profile"),
        ];

        adopt_ids(&mut rows, &stored);
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![11, UNASSIGNED, UNASSIGNED]);
    }

    #[test]
    fn test_adopt_client_ids_restores_secret_values() {
        let mut stored = client_from_dto(&ClientDto::new("web"), NOW);
        stored.secrets = vec![Secret {
            id: 7,
            ..secret_from_dto(&SecretDto::new("hashed"), NOW)
        }];

        let mut sent = stored.clone();
        sent.secrets[0].value.clear();
        let mut foreign = sent.secrets[0].clone();
        foreign.id = 99;
        sent.secrets.push(foreign);

        adopt_client_ids(&mut sent, &stored);
        assert_eq!(sent.secrets[0].value, "hashed");
        assert!(sent.secrets[1].value.is_empty());
        assert!(require_secret_values(&sent.secrets).is_err());
        assert!(require_secret_values(&sent.secrets[..1]).is_ok());
    }

    #[test]
    fn test_adopt_ids_skips_ids_already_claimed() {
        let stored = vec![UserClaim {
            id: 3,
            claim_type: "email".to_string(),
        }];
        let mut rows = vec![
            UserClaim {
                id: 3,
                claim_type: "email".to_string(),
            },
            UserClaim {
                id: UNASSIGNED,
                claim_type: "email".to_string(),
            },
        ];

        adopt_ids(&mut rows, &stored);
        assert_eq!(rows[1].id, UNASSIGNED);
    }
}
