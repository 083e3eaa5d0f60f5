//! Delivers a minted credential to the client.

use authbridge_core::identity::Credential;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::ResponseMode;

/// Build the deep link handing a credential to a native client:
/// `{scheme}://oauth?firebaseToken={token}&provider={provider}`.
///
/// Both values are percent-encoded.
pub fn deep_link_url(scheme: &str, token: &str, provider: &str) -> String {
    format!(
        "{}://oauth?firebaseToken={}&provider={}",
        scheme,
        urlencoding::encode(token),
        urlencoding::encode(provider)
    )
}

/// JSON body returned in direct mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectBody {
    pub provider: String,
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub token: String,
}

/// Outcome of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResponse {
    /// `302 Found` to the contained location.
    Redirect(String),
    /// `200 OK` with a JSON body.
    Direct(DirectBody),
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        match self {
            LoginResponse::Redirect(location) => {
                (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
            }
            LoginResponse::Direct(body) => (StatusCode::OK, Json(body)).into_response(),
        }
    }
}

/// Turns a credential into the configured response shape.
#[derive(Debug, Clone)]
pub struct RedirectResponder {
    mode: ResponseMode,
}

impl RedirectResponder {
    pub fn new(mode: ResponseMode) -> Self {
        Self { mode }
    }

    pub fn respond(&self, credential: &Credential) -> LoginResponse {
        match &self.mode {
            ResponseMode::DeepLink { scheme } => LoginResponse::Redirect(deep_link_url(
                scheme,
                credential.token.as_str(),
                &credential.provider_id,
            )),
            ResponseMode::Direct => LoginResponse::Direct(DirectBody {
                provider: credential.provider_id.clone(),
                uid: credential.uid.clone(),
                username: credential.claims.username.clone(),
                email: credential.claims.email.clone(),
                token: credential.token.as_str().to_string(),
            }),
        }
    }
}
