//! Redis PKCE session storage implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use fred::prelude::*;
use fred::types::SetOptions;

use authbridge_core::auth::{AuthError, PkceGrant, PkceSession, PkceStore, Result};

use super::new_grant;

/// Redis-backed PKCE storage, shared by every broker instance.
///
/// Expiry is enforced by the key TTL; `consume` is a single `GETDEL`.
pub struct RedisPkceStore {
    pool: Pool,
    ttl: Duration,
}

impl RedisPkceStore {
    /// Creates a new Redis PKCE store.
    ///
    /// # Arguments
    ///
    /// * `pool` - Redis connection pool
    /// * `ttl` - Lifetime of a pending session; rounded up to one second
    pub fn new(pool: Pool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    fn key(state: &str) -> String {
        format!("pkce:{}", state)
    }

    /// TTL in whole seconds for `EX`, at least one.
    fn ttl_secs(&self) -> Result<i64> {
        i64::try_from(self.ttl.as_secs().max(1))
            .map_err(|_| AuthError::Storage("PKCE TTL out of range".to_string()))
    }
}

#[async_trait]
impl PkceStore for RedisPkceStore {
    async fn create(&self) -> Result<PkceGrant> {
        let ttl_secs = self.ttl_secs()?;

        loop {
            let grant = new_grant();
            let session = PkceSession {
                state: grant.state.clone(),
                code_verifier: grant.verifier.clone(),
                created_at: Utc::now(),
                ttl: chrono::Duration::seconds(ttl_secs),
            };
            let value =
                serde_json::to_string(&session).map_err(|e| AuthError::Storage(e.to_string()))?;

            // NX: an existing key means a state collision, so draw again.
            let reply: Option<String> = self
                .pool
                .set(
                    Self::key(&grant.state),
                    value,
                    Some(Expiration::EX(ttl_secs)),
                    Some(SetOptions::NX),
                    false,
                )
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;

            if reply.is_some() {
                return Ok(grant);
            }
        }
    }

    async fn consume(&self, state: &str) -> Result<String> {
        let value: Option<String> = self
            .pool
            .getdel(Self::key(state))
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let json = value.ok_or(AuthError::InvalidOrExpiredPkceState)?;
        let session: PkceSession =
            serde_json::from_str(&json).map_err(|e| AuthError::Storage(e.to_string()))?;

        if authbridge_core::auth::is_pkce_expired(&session, Utc::now()) {
            return Err(AuthError::InvalidOrExpiredPkceState);
        }

        Ok(session.code_verifier)
    }
}
