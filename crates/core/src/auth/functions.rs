use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use url::Url;

use super::PkceSession;

/// Length of generated `state` values. 32 alphanumeric characters carry
/// roughly 190 bits of entropy.
pub const STATE_LEN: usize = 32;

/// Generate a random state parameter for CSRF protection.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

/// Check if a PKCE session is past its TTL.
pub fn is_pkce_expired(session: &PkceSession, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(session.created_at) >= session.ttl
}

/// Build the authorize URL for the authorization-code grant.
///
/// `pkce` carries `(state, code_challenge)` for providers that bind the
/// attempt with S256 PKCE.
pub fn build_authorize_url(
    authorize_endpoint: &Url,
    client_id: &str,
    redirect_uri: &str,
    scopes: &[String],
    pkce: Option<(&str, &str)>,
) -> Url {
    let mut url = authorize_endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("response_type", "code")
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &scopes.join(" "));

        if let Some((state, challenge)) = pkce {
            query
                .append_pair("state", state)
                .append_pair("code_challenge", challenge)
                .append_pair("code_challenge_method", "S256");
        }
    }
    url
}

/// Cut a provider response body down to something safe to log.
pub fn truncate_for_log(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
