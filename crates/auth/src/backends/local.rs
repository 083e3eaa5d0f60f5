//! In-process identity store with HS256-signed custom tokens.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authbridge_core::identity::{
    BackendError, BackendResult, CredentialClaims, IdentityBackend, InternalIdentity, NewIdentity,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

const ISSUER: &str = "authbridge";

/// JWT payload of a custom token minted by `LocalBackend`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTokenClaims {
    pub iss: String,
    pub sub: String,
    pub uid: String,
    pub claims: CredentialClaims,
    pub iat: i64,
    pub exp: i64,
}

/// Identity backend keeping identities in memory and signing tokens with a
/// shared HMAC secret.
#[derive(Clone)]
pub struct LocalBackend {
    identities: Arc<RwLock<HashMap<String, InternalIdentity>>>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

impl LocalBackend {
    /// Creates a backend signing with `secret`; tokens expire after `token_ttl`.
    pub fn new(secret: &[u8], token_ttl: Duration) -> Self {
        Self {
            identities: Arc::new(RwLock::new(HashMap::new())),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl,
        }
    }

    /// Verify a token minted by this backend and return its payload.
    pub fn verify(&self, token: &str) -> BackendResult<CustomTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);

        decode::<CustomTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| BackendError::Rejected(e.to_string()))
    }

    /// Number of stored identities.
    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdentityBackend for LocalBackend {
    async fn get_user(&self, uid: &str) -> BackendResult<Option<InternalIdentity>> {
        let identities = self.identities.read().await;
        Ok(identities.get(uid).cloned())
    }

    async fn create_user(&self, uid: &str, fields: &NewIdentity) -> BackendResult<InternalIdentity> {
        let mut identities = self.identities.write().await;
        if identities.contains_key(uid) {
            return Err(BackendError::AlreadyExists {
                uid: uid.to_string(),
            });
        }

        let now = Utc::now();
        let identity = InternalIdentity {
            uid: uid.to_string(),
            provider_id: fields.provider_id.clone(),
            external_id: fields.external_id.clone(),
            display_name: fields.display_name.clone(),
            avatar_url: fields.avatar_url.clone(),
            created_at: now,
            updated_at: now,
        };
        identities.insert(uid.to_string(), identity.clone());
        Ok(identity)
    }

    async fn create_custom_token(
        &self,
        uid: &str,
        claims: &CredentialClaims,
    ) -> BackendResult<String> {
        let iat = Utc::now().timestamp();
        let exp = i64::try_from(self.token_ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| BackendError::Rejected("token TTL out of range".to_string()))?;
        let payload = CustomTokenClaims {
            iss: ISSUER.to_string(),
            sub: uid.to_string(),
            uid: uid.to_string(),
            claims: claims.clone(),
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| BackendError::Rejected(format!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> LocalBackend {
        LocalBackend::new(b"test-signing-secret", Duration::from_secs(3600))
    }

    fn new_identity() -> NewIdentity {
        NewIdentity {
            provider_id: "x".to_string(),
            external_id: "42".to_string(),
            display_name: "Nick".to_string(),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        assert!(backend().get_user("x:42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let backend = backend();
        let created = backend.create_user("x:42", &new_identity()).await.unwrap();

        assert_eq!(created.uid, "x:42");
        assert_eq!(created.display_name, "Nick");
        assert_eq!(backend.get_user("x:42").await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_create_twice_reports_already_exists() {
        let backend = backend();
        backend.create_user("x:42", &new_identity()).await.unwrap();

        let result = backend.create_user("x:42", &new_identity()).await;
        assert_eq!(
            result,
            Err(BackendError::AlreadyExists {
                uid: "x:42".to_string()
            })
        );
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_custom_token_round_trips_claims() {
        let backend = backend();
        let claims = CredentialClaims {
            provider: "x".to_string(),
            username: Some("nick".to_string()),
            email: None,
        };

        let token = backend.create_custom_token("x:42", &claims).await.unwrap();
        let decoded = backend.verify(&token).unwrap();

        assert_eq!(decoded.uid, "x:42");
        assert_eq!(decoded.sub, "x:42");
        assert_eq!(decoded.iss, "authbridge");
        assert_eq!(decoded.claims, claims);
        assert_eq!(decoded.exp - decoded.iat, 3600);
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_rejected_not_wrapped() {
        let backend = LocalBackend::new(b"s", Duration::from_secs(u64::MAX));
        let claims = CredentialClaims {
            provider: "x".to_string(),
            username: None,
            email: None,
        };

        let result = backend.create_custom_token("x:42", &claims).await;
        assert!(matches!(result, Err(BackendError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let claims = CredentialClaims {
            provider: "discord".to_string(),
            username: None,
            email: None,
        };
        let token = LocalBackend::new(b"other-secret", Duration::from_secs(60))
            .create_custom_token("discord:1", &claims)
            .await
            .unwrap();

        assert!(matches!(backend().verify(&token), Err(BackendError::Rejected(_))));
    }
}
