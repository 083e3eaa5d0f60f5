use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors for the authbridge_auth crate.
///
/// This wraps the core `AuthError` taxonomy and adds crate-specific error
/// variants that can't be in the functional core.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A failed login attempt.
    #[error(transparent)]
    Auth(#[from] authbridge_core::auth::AuthError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        use authbridge_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            BrokerError::Auth(core_err) => match core_err {
                CoreError::MissingCode => {
                    tracing::warn!(kind = core_err.kind(), "Rejected callback");
                    (StatusCode::BAD_REQUEST, "Missing authorization code")
                }
                CoreError::InvalidOrExpiredPkceState => {
                    tracing::warn!(kind = core_err.kind(), "Rejected callback");
                    (
                        StatusCode::BAD_REQUEST,
                        "Login session is invalid or expired, please start again",
                    )
                }
                CoreError::UnknownProvider(provider) => {
                    tracing::warn!(kind = core_err.kind(), %provider, "Rejected request");
                    (StatusCode::NOT_FOUND, "Unknown authentication provider")
                }
                CoreError::ProviderTokenExchangeFailed(_)
                | CoreError::ProviderProfileFetchFailed(_)
                | CoreError::IdentityUpsertFailed(_)
                | CoreError::CredentialIssuanceFailed(_)
                | CoreError::Storage(_) => {
                    tracing::error!(kind = core_err.kind(), "Auth error: {}", self);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
                }
            },
            BrokerError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error")
            }
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authbridge_core::auth::AuthError;
    use http_body_util::BodyExt;

    async fn render(error: BrokerError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_map_to_4xx() {
        let (status, _) = render(AuthError::MissingCode.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = render(AuthError::InvalidOrExpiredPkceState.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = render(AuthError::UnknownProvider("github".to_string()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upstream_errors_do_not_leak_detail() {
        let detail = "status 401: {\"error\":\"invalid_client\",\"secret\":\"abc\"}";
        let (status, body) =
            render(AuthError::ProviderTokenExchangeFailed(detail.to_string()).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Authentication failed");
        assert!(!body.contains("invalid_client"));
    }

    #[tokio::test]
    async fn test_every_upstream_kind_is_500() {
        for error in [
            AuthError::ProviderProfileFetchFailed("x".to_string()),
            AuthError::IdentityUpsertFailed("x".to_string()),
            AuthError::CredentialIssuanceFailed("x".to_string()),
            AuthError::Storage("x".to_string()),
        ] {
            let (status, body) = render(error.into()).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "Authentication failed");
        }
    }

    #[tokio::test]
    async fn test_config_error_is_generic() {
        let (status, body) = render(BrokerError::Config("SIGNING_SECRET".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Server configuration error");
    }
}
