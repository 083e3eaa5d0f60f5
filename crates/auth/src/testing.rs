//! Test doubles shared by the unit tests of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authbridge_core::identity::{
    BackendError, BackendResult, CredentialClaims, IdentityBackend, InternalIdentity, NewIdentity,
};

use crate::backends::LocalBackend;

/// Wraps `LocalBackend`, counting calls and optionally slowing or failing them.
#[derive(Clone)]
pub struct CountingBackend {
    pub inner: LocalBackend,
    pub get_calls: Arc<AtomicUsize>,
    pub create_calls: Arc<AtomicUsize>,
    pub token_calls: Arc<AtomicUsize>,
    pub delay: Duration,
    pub fail_with: Option<BackendError>,
}

impl CountingBackend {
    pub fn new() -> Self {
        Self {
            inner: LocalBackend::new(b"test-signing-secret", Duration::from_secs(3600)),
            get_calls: Arc::new(AtomicUsize::new(0)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            token_calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            fail_with: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, error: BackendError) -> Self {
        self.fail_with = Some(error);
        self
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.gets() + self.creates() + self.tokens()
    }

    async fn pause(&self) -> BackendResult<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityBackend for CountingBackend {
    async fn get_user(&self, uid: &str) -> BackendResult<Option<InternalIdentity>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        self.inner.get_user(uid).await
    }

    async fn create_user(&self, uid: &str, fields: &NewIdentity) -> BackendResult<InternalIdentity> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        self.inner.create_user(uid, fields).await
    }

    async fn create_custom_token(
        &self,
        uid: &str,
        claims: &CredentialClaims,
    ) -> BackendResult<String> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await?;
        self.inner.create_custom_token(uid, claims).await
    }
}
