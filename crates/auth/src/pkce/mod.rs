//! PKCE session storage implementations.
//!
//! Provides `PkceStore` implementations for:
//! - In-memory (always available, with a background sweeper)
//! - Redis (with `redis` feature)

mod inmemory;
#[cfg(feature = "redis")]
mod redis_impl;

pub use inmemory::MemoryPkceStore;
#[cfg(feature = "redis")]
pub use redis_impl::RedisPkceStore;

use authbridge_core::auth::{generate_state, PkceGrant};
use oauth2::PkceCodeChallenge;

/// Generate a fresh random `state` plus an S256 verifier/challenge pair.
pub fn new_grant() -> PkceGrant {
    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    PkceGrant {
        state: generate_state(),
        verifier: verifier.secret().to_string(),
        challenge: challenge.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grant_shapes() {
        let grant = new_grant();

        assert_eq!(grant.state.len(), authbridge_core::auth::STATE_LEN);
        // RFC 7636: 43..=128 chars from the unreserved set.
        assert!((43..=128).contains(&grant.verifier.len()));
        assert_eq!(grant.challenge.len(), 43);
        assert_ne!(grant.verifier, grant.challenge);
    }

    #[test]
    fn test_new_grant_is_random() {
        let a = new_grant();
        let b = new_grant();
        assert_ne!(a.state, b.state);
        assert_ne!(a.verifier, b.verifier);
    }
}
