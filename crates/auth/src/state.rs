//! Application state for auth.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use authbridge_core::auth::{AuthError, PkceStore, ProviderClient};
use authbridge_core::identity::IdentityBackend;

use crate::config::{BrokerConfig, ResponseMode};
use crate::error::BrokerError;
use crate::identity::IdentityMapper;
use crate::issuer::CredentialIssuer;
use crate::providers::OAuthProvider;
use crate::responder::RedirectResponder;

/// Shared state for auth handlers.
#[derive(Clone)]
pub struct AuthState {
    providers: Arc<HashMap<String, Arc<dyn ProviderClient>>>,
    pub identities: IdentityMapper,
    pub issuer: CredentialIssuer,
    pub responder: RedirectResponder,
}

impl AuthState {
    /// Creates the state from configuration, building one `OAuthProvider`
    /// per configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client
    /// cannot be built.
    pub fn new(
        config: &BrokerConfig,
        pkce: Arc<dyn PkceStore>,
        backend: Arc<dyn IdentityBackend>,
    ) -> Result<Self, BrokerError> {
        config.validate()?;

        let providers = config
            .providers
            .iter()
            .map(|provider| {
                OAuthProvider::new(provider.clone(), pkce.clone(), config.upstream_timeout)
                    .map(|client| Arc::new(client) as Arc<dyn ProviderClient>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_providers(
            providers,
            backend,
            config.response_mode.clone(),
            config.upstream_timeout,
        ))
    }

    /// Creates the state from already-built provider clients.
    pub fn with_providers(
        providers: Vec<Arc<dyn ProviderClient>>,
        backend: Arc<dyn IdentityBackend>,
        response_mode: ResponseMode,
        backend_timeout: Duration,
    ) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.id().to_string(), provider))
            .collect();

        Self {
            providers: Arc::new(providers),
            identities: IdentityMapper::new(backend.clone(), backend_timeout),
            issuer: CredentialIssuer::new(backend, backend_timeout),
            responder: RedirectResponder::new(response_mode),
        }
    }

    /// Gets the provider client registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProvider` if no provider has that id.
    pub fn get_provider(&self, id: &str) -> Result<&dyn ProviderClient, AuthError> {
        self.providers
            .get(id)
            .map(|p| p.as_ref())
            .ok_or_else(|| AuthError::UnknownProvider(id.to_string()))
    }

    /// Ids of every configured provider, sorted.
    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
