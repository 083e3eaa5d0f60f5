//! OAuth2 identity broker for authbridge.
//!
//! This crate provides:
//! - A data-configured provider adapter (Discord-style and PKCE-style providers)
//! - Keyed, TTL-bounded PKCE session storage (in-memory, or Redis via feature flag)
//! - Identity resolution with per-uid create-if-absent
//! - Credential minting through an external signing backend
//! - Deep-link or JSON responses, and the axum routes tying it together

mod backends;
mod config;
mod error;
mod handlers;
mod identity;
mod issuer;
mod pkce;
mod providers;
mod responder;
mod state;
#[cfg(test)]
mod testing;

pub use backends::{CustomTokenClaims, LocalBackend};
pub use config::{BrokerConfig, ProviderConfig, ResponseMode};
pub use error::BrokerError;
pub use handlers::auth_routes;
pub use identity::IdentityMapper;
pub use issuer::CredentialIssuer;
#[cfg(feature = "redis")]
pub use pkce::RedisPkceStore;
pub use pkce::{new_grant, MemoryPkceStore};
pub use providers::{normalize_profile, OAuthProvider};
pub use responder::{deep_link_url, DirectBody, LoginResponse, RedirectResponder};
pub use state::AuthState;
