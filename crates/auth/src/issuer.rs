//! Credential minting through the identity backend.

use std::sync::Arc;
use std::time::Duration;

use authbridge_core::auth::{AuthError, Result};
use authbridge_core::identity::{
    Credential, CredentialClaims, CredentialToken, IdentityBackend, InternalIdentity,
};
use chrono::Utc;

/// Mints short-lived credentials for resolved identities. The broker never
/// holds signing keys; the backend does.
#[derive(Clone)]
pub struct CredentialIssuer {
    backend: Arc<dyn IdentityBackend>,
    timeout: Duration,
}

impl CredentialIssuer {
    pub fn new(backend: Arc<dyn IdentityBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Mint a credential for `identity` carrying `claims`.
    pub async fn mint(
        &self,
        identity: &InternalIdentity,
        claims: CredentialClaims,
    ) -> Result<Credential> {
        let token = tokio::time::timeout(
            self.timeout,
            self.backend.create_custom_token(&identity.uid, &claims),
        )
        .await
        .map_err(|_| AuthError::CredentialIssuanceFailed("backend timed out".to_string()))?
        .map_err(|e| AuthError::CredentialIssuanceFailed(e.to_string()))?;

        if token.is_empty() {
            return Err(AuthError::CredentialIssuanceFailed(
                "backend returned an empty token".to_string(),
            ));
        }

        tracing::debug!(uid = %identity.uid, "Minted credential");

        Ok(Credential {
            uid: identity.uid.clone(),
            provider_id: identity.provider_id.clone(),
            claims,
            token: CredentialToken::new(token),
            issued_at: Utc::now(),
        })
    }
}
