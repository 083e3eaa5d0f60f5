use async_trait::async_trait;

use super::{BackendResult, CredentialClaims, InternalIdentity, NewIdentity};

/// The identity/credential backend: persistence, trust and signing keys all
/// live behind this trait.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Look up an identity. `Ok(None)` means the uid is unknown.
    async fn get_user(&self, uid: &str) -> BackendResult<Option<InternalIdentity>>;

    /// Create an identity. Implementations that can detect a concurrent
    /// create report it as `BackendError::AlreadyExists`.
    async fn create_user(&self, uid: &str, fields: &NewIdentity) -> BackendResult<InternalIdentity>;

    /// Mint a signed, time-bounded token for `uid` carrying `claims`.
    async fn create_custom_token(&self, uid: &str, claims: &CredentialClaims)
        -> BackendResult<String>;
}
