use std::time::Duration;

use authbridge_core::auth::{
    validate_deep_link_scheme, validate_provider_id, ProviderKind, TokenAuthMethod,
};
use oauth2::ClientSecret;
use url::Url;

use crate::error::BrokerError;

const DISCORD_AUTHORIZE_URL: &str = "https://discord.com/oauth2/authorize";
const DISCORD_TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const DISCORD_PROFILE_URL: &str = "https://discord.com/api/users/@me";

const X_AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";
const X_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
const X_PROFILE_URL: &str = "https://api.twitter.com/2/users/me?user.fields=profile_image_url";

/// Upper bound for every configured TTL and timeout (one year).
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration for a single OAuth2 provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: String,
    pub kind: ProviderKind,
    pub authorize_endpoint: Url,
    pub token_endpoint: Url,
    pub profile_endpoint: Url,
    pub client_id: String,
    pub client_secret: Option<ClientSecret>,
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
    pub requires_pkce: bool,
    pub token_auth: TokenAuthMethod,
}

impl ProviderConfig {
    /// Discord preset: secret in the token request body, no PKCE.
    pub fn discord(
        client_id: String,
        client_secret: String,
        redirect_uri: Url,
    ) -> Result<Self, BrokerError> {
        Ok(Self {
            id: ProviderKind::Discord.to_string(),
            kind: ProviderKind::Discord,
            authorize_endpoint: parse_url(DISCORD_AUTHORIZE_URL)?,
            token_endpoint: parse_url(DISCORD_TOKEN_URL)?,
            profile_endpoint: parse_url(DISCORD_PROFILE_URL)?,
            client_id,
            client_secret: Some(ClientSecret::new(client_secret)),
            redirect_uri,
            scopes: vec!["identify".to_string(), "email".to_string()],
            requires_pkce: false,
            token_auth: TokenAuthMethod::ClientSecretPost,
        })
    }

    /// X (Twitter) preset: basic client auth and S256 PKCE.
    pub fn x(client_id: String, client_secret: String, redirect_uri: Url) -> Result<Self, BrokerError> {
        Ok(Self {
            id: ProviderKind::X.to_string(),
            kind: ProviderKind::X,
            authorize_endpoint: parse_url(X_AUTHORIZE_URL)?,
            token_endpoint: parse_url(X_TOKEN_URL)?,
            profile_endpoint: parse_url(X_PROFILE_URL)?,
            client_id,
            client_secret: Some(ClientSecret::new(client_secret)),
            redirect_uri,
            scopes: vec!["tweet.read".to_string(), "users.read".to_string()],
            requires_pkce: true,
            token_auth: TokenAuthMethod::ClientSecretBasic,
        })
    }

    /// Point the provider at different endpoints (self-hosted or test doubles).
    pub fn with_endpoints(mut self, authorize: Url, token: Url, profile: Url) -> Self {
        self.authorize_endpoint = authorize;
        self.token_endpoint = token;
        self.profile_endpoint = profile;
        self
    }
}

/// How a successful login is returned to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseMode {
    /// `302` to `{scheme}://oauth?firebaseToken=..&provider=..`.
    DeepLink { scheme: String },
    /// `200` with a JSON body.
    Direct,
}

/// Complete broker configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub base_url: Url,
    pub providers: Vec<ProviderConfig>,
    pub response_mode: ResponseMode,
    pub pkce_ttl: Duration,
    pub upstream_timeout: Duration,
    pub signing_secret: Option<String>,
    pub credential_ttl: Duration,
    /// Only used when the `redis` feature is enabled.
    pub redis_url: String,
}

impl BrokerConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AUTH_BASE_URL`: Base URL for callback redirects (default: `http://localhost:3000`)
    /// - `DISCORD_CLIENT_ID`: Discord client ID (optional, enables Discord)
    /// - `DISCORD_CLIENT_SECRET`: Discord client secret (required if Discord enabled)
    /// - `DISCORD_REDIRECT_URI`: Callback URL (default: `{AUTH_BASE_URL}/auth/discord/callback`)
    /// - `X_CLIENT_ID`: X client ID (optional, enables X)
    /// - `X_CLIENT_SECRET`: X client secret (required if X enabled)
    /// - `X_REDIRECT_URI`: Callback URL (default: `{AUTH_BASE_URL}/auth/x/callback`)
    /// - `RESPONSE_MODE`: `deep_link` or `direct` (default: `deep_link`)
    /// - `DEEP_LINK_SCHEME`: Custom URI scheme of the native client (default: `authbridge`)
    /// - `PKCE_TTL_SECS`: Lifetime of a pending PKCE session (default: 600)
    /// - `UPSTREAM_TIMEOUT_SECS`: Timeout of each outbound call (default: 10)
    /// - `SIGNING_SECRET`: HMAC secret for the local signing backend (optional)
    /// - `CREDENTIAL_TTL_SECS`: Lifetime of minted credentials (default: 3600)
    /// - `REDIS_URL`: Redis connection URL (default: `redis://localhost:6379`)
    ///
    /// # Errors
    ///
    /// Returns an error if a provider is partially configured (e.g., client ID without
    /// secret) or a value fails validation.
    pub fn from_env() -> Result<Self, BrokerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. `from_env` is this over `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BrokerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_url(
            &lookup("AUTH_BASE_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
        )?;

        let mut providers = Vec::new();

        if let Some(client_id) = lookup("DISCORD_CLIENT_ID") {
            let secret = require(&lookup, "DISCORD_CLIENT_SECRET")?;
            let redirect_uri = redirect_uri_for(&lookup, "DISCORD_REDIRECT_URI", &base_url, "discord")?;
            providers.push(ProviderConfig::discord(client_id, secret, redirect_uri)?);
        }

        if let Some(client_id) = lookup("X_CLIENT_ID") {
            let secret = require(&lookup, "X_CLIENT_SECRET")?;
            let redirect_uri = redirect_uri_for(&lookup, "X_REDIRECT_URI", &base_url, "x")?;
            providers.push(ProviderConfig::x(client_id, secret, redirect_uri)?);
        }

        let response_mode = match lookup("RESPONSE_MODE").as_deref() {
            None | Some("deep_link") => {
                let scheme = lookup("DEEP_LINK_SCHEME").unwrap_or_else(|| "authbridge".to_string());
                if validate_deep_link_scheme(&scheme).is_none() {
                    return Err(BrokerError::Config(format!(
                        "DEEP_LINK_SCHEME is not a valid URI scheme: {}",
                        scheme
                    )));
                }
                ResponseMode::DeepLink { scheme }
            }
            Some("direct") => ResponseMode::Direct,
            Some(other) => {
                return Err(BrokerError::Config(format!(
                    "RESPONSE_MODE must be `deep_link` or `direct`, got `{}`",
                    other
                )))
            }
        };

        let pkce_ttl = Duration::from_secs(secs(&lookup, "PKCE_TTL_SECS", 600)?);
        let upstream_timeout = Duration::from_secs(secs(&lookup, "UPSTREAM_TIMEOUT_SECS", 10)?);
        let credential_ttl = Duration::from_secs(secs(&lookup, "CREDENTIAL_TTL_SECS", 3600)?);

        let config = Self {
            base_url,
            providers,
            response_mode,
            pkce_ttl,
            upstream_timeout,
            signing_secret: lookup("SIGNING_SECRET"),
            credential_ttl,
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that a hand-built config may violate.
    pub fn validate(&self) -> Result<(), BrokerError> {
        let mut seen = std::collections::HashSet::new();
        for provider in &self.providers {
            if validate_provider_id(&provider.id).is_none() {
                return Err(BrokerError::Config(format!(
                    "invalid provider id: {}",
                    provider.id
                )));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(BrokerError::Config(format!(
                    "provider configured twice: {}",
                    provider.id
                )));
            }
        }

        if self.pkce_ttl.is_zero() {
            return Err(BrokerError::Config("PKCE TTL must be positive".to_string()));
        }
        if self.upstream_timeout.is_zero() {
            return Err(BrokerError::Config(
                "upstream timeout must be positive".to_string(),
            ));
        }

        for (name, value) in [
            ("PKCE TTL", self.pkce_ttl),
            ("upstream timeout", self.upstream_timeout),
            ("credential TTL", self.credential_ttl),
        ] {
            if value > MAX_TTL {
                return Err(BrokerError::Config(format!(
                    "{} must not exceed {} seconds",
                    name,
                    MAX_TTL.as_secs()
                )));
            }
        }

        Ok(())
    }
}

fn parse_url(value: &str) -> Result<Url, BrokerError> {
    Url::parse(value).map_err(|e| BrokerError::Config(format!("invalid URL `{}`: {}", value, e)))
}

fn require<F>(lookup: &F, key: &str) -> Result<String, BrokerError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| BrokerError::Config(format!("{} must be set", key)))
}

fn redirect_uri_for<F>(
    lookup: &F,
    key: &str,
    base_url: &Url,
    provider: &str,
) -> Result<Url, BrokerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => parse_url(&value),
        None => base_url
            .join(&format!("/auth/{}/callback", provider))
            .map_err(|e| BrokerError::Config(e.to_string())),
    }
}

fn secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, BrokerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|_| BrokerError::Config(format!("{} must be a number of seconds", key))),
        None => Ok(default),
    }
}
