use thiserror::Error;

/// Failure kinds of a single login attempt.
///
/// The first three variants are caused by the client and are raised before
/// any upstream call is made. The rest describe upstream failures; their
/// payload is internal detail for logs and must never reach the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization code missing from callback")]
    MissingCode,

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("invalid or expired PKCE state")]
    InvalidOrExpiredPkceState,

    #[error("provider token exchange failed: {0}")]
    ProviderTokenExchangeFailed(String),

    #[error("provider profile fetch failed: {0}")]
    ProviderProfileFetchFailed(String),

    #[error("identity upsert failed: {0}")]
    IdentityUpsertFailed(String),

    #[error("credential issuance failed: {0}")]
    CredentialIssuanceFailed(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Whether the failure was caused by the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCode | Self::UnknownProvider(_) | Self::InvalidOrExpiredPkceState
        )
    }

    /// Stable machine-readable name of the failure kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::UnknownProvider(_) => "unknown_provider",
            Self::InvalidOrExpiredPkceState => "invalid_or_expired_pkce_state",
            Self::ProviderTokenExchangeFailed(_) => "provider_token_exchange_failed",
            Self::ProviderProfileFetchFailed(_) => "provider_profile_fetch_failed",
            Self::IdentityUpsertFailed(_) => "identity_upsert_failed",
            Self::CredentialIssuanceFailed(_) => "credential_issuance_failed",
            Self::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(AuthError::MissingCode.is_client_error());
        assert!(AuthError::UnknownProvider("github".to_string()).is_client_error());
        assert!(AuthError::InvalidOrExpiredPkceState.is_client_error());
    }

    #[test]
    fn upstream_errors_are_not_client_errors() {
        assert!(!AuthError::ProviderTokenExchangeFailed("500".to_string()).is_client_error());
        assert!(!AuthError::ProviderProfileFetchFailed("401".to_string()).is_client_error());
        assert!(!AuthError::IdentityUpsertFailed("down".to_string()).is_client_error());
        assert!(!AuthError::CredentialIssuanceFailed("down".to_string()).is_client_error());
        assert!(!AuthError::Storage("redis".to_string()).is_client_error());
    }

    #[test]
    fn display_includes_detail() {
        let error = AuthError::ProviderTokenExchangeFailed("status 401".to_string());
        assert_eq!(
            error.to_string(),
            "provider token exchange failed: status 401"
        );
    }

    #[test]
    fn kind_is_snake_case() {
        assert_eq!(
            AuthError::InvalidOrExpiredPkceState.kind(),
            "invalid_or_expired_pkce_state"
        );
        assert_eq!(AuthError::MissingCode.kind(), "missing_code");
    }
}
