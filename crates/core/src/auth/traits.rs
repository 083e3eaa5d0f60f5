use async_trait::async_trait;
use url::Url;

use super::{AccessToken, AuthError, ExternalProfile, PkceGrant};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Keyed, TTL-bounded storage of PKCE verifiers.
#[async_trait]
pub trait PkceStore: Send + Sync {
    /// Generate a fresh `(state, verifier, challenge)` triple and store
    /// `state -> verifier` until the TTL runs out.
    async fn create(&self) -> Result<PkceGrant>;

    /// Atomically remove and return the verifier stored under `state`.
    ///
    /// Unknown, already consumed and expired states all yield
    /// `InvalidOrExpiredPkceState`.
    async fn consume(&self, state: &str) -> Result<String>;
}

/// One configured external identity provider.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Route identifier, e.g. `discord`.
    fn id(&self) -> &str;

    /// Whether the authorize/token steps are bound with PKCE.
    fn requires_pkce(&self) -> bool;

    /// Build the URL the browser is redirected to, creating a PKCE session
    /// first when the provider needs one.
    async fn authorization_url(&self) -> Result<Url>;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str, state: Option<&str>) -> Result<AccessToken>;

    /// Fetch and normalize the profile of the token's owner.
    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<ExternalProfile>;
}
