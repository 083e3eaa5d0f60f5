use crate::auth::ExternalProfile;

use super::{CredentialClaims, NewIdentity};

/// Separator between provider id and external id in a `uid`.
pub const UID_SEPARATOR: char = ':';

/// Compose the provider-namespaced `uid` for an external account.
///
/// Provider ids never contain the separator, so the mapping is injective
/// across providers.
pub fn compose_uid(provider_id: &str, external_id: &str) -> String {
    format!("{}{}{}", provider_id, UID_SEPARATOR, external_id)
}

/// Fields for the first-time creation of an identity.
pub fn new_identity_from_profile(profile: &ExternalProfile) -> NewIdentity {
    NewIdentity {
        provider_id: profile.provider_id.clone(),
        external_id: profile.external_id.clone(),
        display_name: profile.display_name.clone(),
        avatar_url: profile.avatar_url.clone(),
    }
}

/// Claims carried by the credential minted for `profile`.
pub fn claims_for_profile(profile: &ExternalProfile) -> CredentialClaims {
    CredentialClaims {
        provider: profile.provider_id.clone(),
        username: Some(profile.username.clone()),
        email: profile.email.clone(),
    }
}
