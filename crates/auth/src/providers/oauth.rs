//! Config-driven OAuth2 authorization-code client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use authbridge_core::auth::{
    build_authorize_url, truncate_for_log, AccessToken, AuthError, ExternalProfile, PkceStore,
    ProviderClient, Result, TokenAuthMethod,
};
use serde::Deserialize;
use url::Url;

use super::normalize_profile;
use crate::config::ProviderConfig;
use crate::error::BrokerError;

/// Longest provider response body carried into an error message.
const MAX_LOGGED_BODY: usize = 256;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 provider driven entirely by its `ProviderConfig`.
pub struct OAuthProvider {
    config: ProviderConfig,
    http_client: reqwest::Client,
    pkce: Arc<dyn PkceStore>,
}

impl OAuthProvider {
    /// Create a provider client.
    ///
    /// Every outbound request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: ProviderConfig,
        pkce: Arc<dyn PkceStore>,
        timeout: Duration,
    ) -> std::result::Result<Self, BrokerError> {
        // Build HTTP client without redirect following (security requirement)
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .user_agent(concat!("authbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BrokerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            pkce,
        })
    }
}

fn describe_transport_error(error: reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.without_url().to_string()
    }
}

#[async_trait]
impl ProviderClient for OAuthProvider {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn requires_pkce(&self) -> bool {
        self.config.requires_pkce
    }

    async fn authorization_url(&self) -> Result<Url> {
        let grant = if self.config.requires_pkce {
            Some(self.pkce.create().await?)
        } else {
            None
        };

        let url = build_authorize_url(
            &self.config.authorize_endpoint,
            &self.config.client_id,
            self.config.redirect_uri.as_str(),
            &self.config.scopes,
            grant
                .as_ref()
                .map(|g| (g.state.as_str(), g.challenge.as_str())),
        );

        Ok(url)
    }

    async fn exchange_code(&self, code: &str, state: Option<&str>) -> Result<AccessToken> {
        // The verifier is consumed before any network call so a replayed or
        // forged state never reaches the provider.
        let verifier = if self.config.requires_pkce {
            let state = state.ok_or(AuthError::InvalidOrExpiredPkceState)?;
            Some(self.pkce.consume(state).await?)
        } else {
            None
        };

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];
        if let Some(verifier) = verifier.as_deref() {
            form.push(("code_verifier", verifier));
        }

        let mut request = self
            .http_client
            .post(self.config.token_endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json");

        match (self.config.token_auth, self.config.client_secret.as_ref()) {
            (TokenAuthMethod::ClientSecretPost, Some(secret)) => {
                form.push(("client_secret", secret.secret().as_str()));
            }
            (TokenAuthMethod::ClientSecretBasic, Some(secret)) => {
                request = request.basic_auth(&self.config.client_id, Some(secret.secret()));
            }
            (_, None) => {}
        }

        let response = request
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::ProviderTokenExchangeFailed(describe_transport_error(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::ProviderTokenExchangeFailed(describe_transport_error(e)))?;

        if !status.is_success() {
            tracing::warn!(
                provider = %self.config.id,
                %status,
                body = %truncate_for_log(&body, MAX_LOGGED_BODY),
                "Token endpoint rejected the code"
            );
            return Err(AuthError::ProviderTokenExchangeFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::ProviderTokenExchangeFailed(format!("malformed token response: {}", e))
        })?;

        if token.access_token.is_empty() {
            return Err(AuthError::ProviderTokenExchangeFailed(
                "empty access token".to_string(),
            ));
        }

        tracing::debug!(provider = %self.config.id, "Exchanged authorization code");
        Ok(AccessToken::new(token.access_token))
    }

    async fn fetch_profile(&self, access_token: &AccessToken) -> Result<ExternalProfile> {
        let response = self
            .http_client
            .get(self.config.profile_endpoint.clone())
            .bearer_auth(access_token.secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::ProviderProfileFetchFailed(describe_transport_error(e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::ProviderProfileFetchFailed(describe_transport_error(e)))?;

        if !status.is_success() {
            tracing::warn!(
                provider = %self.config.id,
                %status,
                body = %truncate_for_log(&body, MAX_LOGGED_BODY),
                "Profile endpoint rejected the token"
            );
            return Err(AuthError::ProviderProfileFetchFailed(format!(
                "profile endpoint returned {}",
                status
            )));
        }

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            AuthError::ProviderProfileFetchFailed(format!("malformed profile response: {}", e))
        })?;

        normalize_profile(&self.config.id, self.config.kind, &payload)
    }
}
