//! In-memory PKCE session storage.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use authbridge_core::auth::{is_pkce_expired, AuthError, PkceGrant, PkceSession, PkceStore, Result};

use super::new_grant;

/// In-memory PKCE store for single-instance deployments and tests.
///
/// Entries live in a `HashMap` behind an `Arc<Mutex<_>>`, so clones share the
/// same map. Expired entries are rejected on `consume` and dropped by
/// `purge_expired`.
#[derive(Debug, Clone)]
pub struct MemoryPkceStore {
    sessions: Arc<Mutex<HashMap<String, PkceSession>>>,
    ttl: chrono::Duration,
}

impl MemoryPkceStore {
    /// Creates an empty store whose sessions live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !is_pkce_expired(session, now));
        before - sessions.len()
    }

    /// Number of sessions currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Run `purge_expired` every `interval` until the handle is aborted.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired PKCE sessions");
                }
            }
        })
    }
}

#[async_trait]
impl PkceStore for MemoryPkceStore {
    async fn create(&self) -> Result<PkceGrant> {
        let mut sessions = self.sessions.lock().await;
        loop {
            let grant = new_grant();
            match sessions.entry(grant.state.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(PkceSession {
                        state: grant.state.clone(),
                        code_verifier: grant.verifier.clone(),
                        created_at: Utc::now(),
                        ttl: self.ttl,
                    });
                    return Ok(grant);
                }
            }
        }
    }

    async fn consume(&self, state: &str) -> Result<String> {
        let session = self
            .sessions
            .lock()
            .await
            .remove(state)
            .ok_or(AuthError::InvalidOrExpiredPkceState)?;

        if is_pkce_expired(&session, Utc::now()) {
            return Err(AuthError::InvalidOrExpiredPkceState);
        }

        Ok(session.code_verifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn store() -> MemoryPkceStore {
        MemoryPkceStore::new(Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_create_then_consume_returns_verifier() {
        let store = store();
        let grant = store.create().await.unwrap();

        let verifier = store.consume(&grant.state).await.unwrap();
        assert_eq!(verifier, grant.verifier);
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let store = store();
        let grant = store.create().await.unwrap();

        store.consume(&grant.state).await.unwrap();
        let second = store.consume(&grant.state).await;
        assert!(matches!(second, Err(AuthError::InvalidOrExpiredPkceState)));
    }

    #[tokio::test]
    async fn test_consume_unknown_state() {
        let store = store();
        let result = store.consume("never-issued").await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredPkceState)));
    }

    #[tokio::test]
    async fn test_consume_expired_state_is_rejected_and_removed() {
        let store = MemoryPkceStore::new(Duration::ZERO);
        let grant = store.create().await.unwrap();

        let result = store.consume(&grant.state).await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredPkceState)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_distinct_states() {
        let store = store();
        let mut handles = Vec::new();
        for _ in 0..1000 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.create().await.unwrap() }));
        }

        let mut states = HashSet::new();
        for handle in handles {
            states.insert(handle.await.unwrap().state);
        }

        assert_eq!(states.len(), 1000);
        assert_eq!(store.len().await, 1000);
    }

    #[tokio::test]
    async fn test_concurrent_consumes_succeed_exactly_once() {
        let store = store();
        let grant = store.create().await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let state = grant.state.clone();
            handles.push(tokio::spawn(async move { store.consume(&state).await }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_sessions() {
        let store = store();
        store.create().await.unwrap();
        store.create().await.unwrap();

        assert_eq!(store.purge_expired().await, 0);
        assert_eq!(store.len().await, 2);

        let expired = MemoryPkceStore::new(Duration::ZERO);
        expired.create().await.unwrap();
        assert_eq!(expired.purge_expired().await, 1);
        assert!(expired.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweeper_purges_in_background() {
        let store = MemoryPkceStore::new(Duration::ZERO);
        store.create().await.unwrap();

        let handle = store.spawn_sweeper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.is_empty().await);
        handle.abort();
    }
}
