//! HTTP handlers for auth routes.

use authbridge_core::auth::AuthError;
use authbridge_core::identity::claims_for_profile;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::BrokerError;
use crate::responder::LoginResponse;
use crate::AuthState;

/// Query parameters for OAuth callback.
///
/// Every field is optional: a provider may send `error` instead of `code`,
/// and non-PKCE providers may omit `state`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Creates the auth router.
///
/// Routes:
/// - `GET /auth/{provider}` - Redirect the browser to the provider's authorize page
/// - `GET /auth/{provider}/callback` - Complete the login and deliver a credential
pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/auth/{provider}", get(login))
        .route("/auth/{provider}/callback", get(callback))
}

async fn login(
    State(state): State<AuthState>,
    Path(provider_id): Path<String>,
) -> Result<Response, BrokerError> {
    let provider = state.get_provider(&provider_id)?;
    let url = provider.authorization_url().await?;

    tracing::debug!(provider = %provider_id, pkce = provider.requires_pkce(), "Starting login");
    Ok((StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response())
}

async fn callback(
    State(state): State<AuthState>,
    Path(provider_id): Path<String>,
    Query(params): Query<CallbackQuery>,
) -> Result<LoginResponse, BrokerError> {
    let provider = state.get_provider(&provider_id)?;

    if let Some(error) = params.error.as_deref() {
        tracing::info!(provider = %provider_id, %error, "Provider returned an error");
    }
    let code = params
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or(AuthError::MissingCode)?;

    let access_token = provider.exchange_code(code, params.state.as_deref()).await?;
    let profile = provider.fetch_profile(&access_token).await?;
    tracing::debug!(
        provider = %provider_id,
        external_id = %profile.external_id,
        "Fetched provider profile"
    );

    let identity = state.identities.resolve(&profile).await?;
    let credential = state
        .issuer
        .mint(&identity, claims_for_profile(&profile))
        .await?;

    tracing::info!(provider = %provider_id, uid = %credential.uid, "Login completed");
    Ok(state.responder.respond(&credential))
}
