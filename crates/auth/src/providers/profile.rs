//! Provider profile normalization.

use authbridge_core::auth::{AuthError, ExternalProfile, ProviderKind, Result};
use serde_json::Value;

const DISCORD_CDN: &str = "https://cdn.discordapp.com/avatars";

/// Normalize a provider's user payload into an `ExternalProfile`.
///
/// X wraps the user in a `data` envelope, Discord returns it bare; both are
/// accepted. `id` may be a string or a number. A payload without an id or
/// username is rejected.
pub fn normalize_profile(provider_id: &str, kind: ProviderKind, payload: &Value) -> Result<ExternalProfile> {
    let user = match payload.get("data") {
        Some(data) if data.is_object() => data,
        _ => payload,
    };

    let external_id = match user.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(AuthError::ProviderProfileFetchFailed(
                "profile has no user id".to_string(),
            ))
        }
    };

    let username = non_empty(user, "username").ok_or_else(|| {
        AuthError::ProviderProfileFetchFailed("profile has no username".to_string())
    })?;

    let (display_name, avatar_url) = match kind {
        ProviderKind::Discord => (
            non_empty(user, "global_name"),
            non_empty(user, "avatar")
                .map(|hash| format!("{}/{}/{}.png", DISCORD_CDN, external_id, hash)),
        ),
        ProviderKind::X => (non_empty(user, "name"), non_empty(user, "profile_image_url")),
    };

    Ok(ExternalProfile {
        provider_id: provider_id.to_string(),
        external_id,
        display_name: display_name.unwrap_or_else(|| username.clone()),
        username,
        avatar_url,
        email: non_empty(user, "email"),
    })
}

fn non_empty(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
