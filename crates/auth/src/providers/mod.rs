//! OAuth2 provider adapter.
//!
//! A single `ProviderClient` implementation driven by `ProviderConfig`:
//! Discord-style providers (secret in the body, no PKCE) and X-style
//! providers (basic client auth plus S256 PKCE) differ only in data.

mod oauth;
mod profile;

pub use oauth::OAuthProvider;
pub use profile::normalize_profile;
