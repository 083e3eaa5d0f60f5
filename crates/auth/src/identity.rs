//! Identity mapping: external profile to stable internal identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use authbridge_core::auth::{AuthError, ExternalProfile, Result};
use authbridge_core::identity::{
    compose_uid, new_identity_from_profile, BackendError, IdentityBackend, InternalIdentity,
};
use tokio::sync::Mutex as AsyncMutex;

type GuardMap = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Resolves external profiles to internal identities, creating them on
/// first sight.
///
/// Concurrent resolves of the same uid are serialized in-process so only one
/// of them attempts the create; a create that still loses a race (another
/// instance) is recovered by re-reading.
#[derive(Clone)]
pub struct IdentityMapper {
    backend: Arc<dyn IdentityBackend>,
    timeout: Duration,
    guards: Arc<GuardMap>,
}

/// Holds the per-uid lock entry; drops the map entry when it is the last user.
struct UidGuard<'a> {
    guards: &'a GuardMap,
    uid: String,
    lock: Arc<AsyncMutex<()>>,
}

impl<'a> UidGuard<'a> {
    fn acquire(guards: &'a GuardMap, uid: &str) -> Self {
        let lock = guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(uid.to_string())
            .or_default()
            .clone();
        Self {
            guards,
            uid: uid.to_string(),
            lock,
        }
    }
}

impl Drop for UidGuard<'_> {
    fn drop(&mut self) {
        let mut guards = self.guards.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here: nobody else is waiting.
        if Arc::strong_count(&self.lock) == 2 {
            guards.remove(&self.uid);
        }
    }
}

impl IdentityMapper {
    /// Each backend call is bounded by `timeout`.
    pub fn new(backend: Arc<dyn IdentityBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            guards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the identity for `profile`, creating it if it does not exist.
    ///
    /// An existing identity is returned as stored; its metadata is not
    /// refreshed from the profile.
    pub async fn resolve(&self, profile: &ExternalProfile) -> Result<InternalIdentity> {
        let uid = compose_uid(&profile.provider_id, &profile.external_id);

        let guard = UidGuard::acquire(&self.guards, &uid);
        let _held = guard.lock.lock().await;

        if let Some(identity) = self.get(&uid).await? {
            tracing::debug!(%uid, "Resolved existing identity");
            return Ok(identity);
        }

        let fields = new_identity_from_profile(profile);
        let created = tokio::time::timeout(self.timeout, self.backend.create_user(&uid, &fields))
            .await
            .map_err(|_| AuthError::IdentityUpsertFailed("backend timed out".to_string()))?;

        match created {
            Ok(identity) => {
                tracing::info!(%uid, provider = %profile.provider_id, "Created identity");
                Ok(identity)
            }
            Err(BackendError::AlreadyExists { .. }) => {
                tracing::debug!(%uid, "Identity created concurrently, re-reading");
                self.get(&uid).await?.ok_or_else(|| {
                    AuthError::IdentityUpsertFailed(format!(
                        "identity {} reported as existing but not found",
                        uid
                    ))
                })
            }
            Err(e) => Err(AuthError::IdentityUpsertFailed(e.to_string())),
        }
    }

    async fn get(&self, uid: &str) -> Result<Option<InternalIdentity>> {
        tokio::time::timeout(self.timeout, self.backend.get_user(uid))
            .await
            .map_err(|_| AuthError::IdentityUpsertFailed("backend timed out".to_string()))?
            .map_err(|e| AuthError::IdentityUpsertFailed(e.to_string()))
    }

    #[cfg(test)]
    fn pending_guards(&self) -> usize {
        self.guards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
