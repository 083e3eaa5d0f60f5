/// Validates a deep-link URI scheme (RFC 3986 `scheme` production).
///
/// Returns `Some(scheme)` if the value can be used as `{scheme}://oauth`,
/// `None` otherwise.
///
/// # Examples
///
/// ```
/// use authbridge_core::auth::validate_deep_link_scheme;
///
/// assert_eq!(validate_deep_link_scheme("glovesapp"), Some("glovesapp"));
/// assert_eq!(validate_deep_link_scheme("com.example.app"), Some("com.example.app"));
///
/// // Must start with a letter
/// assert_eq!(validate_deep_link_scheme("1app"), None);
///
/// // No separators or whitespace
/// assert_eq!(validate_deep_link_scheme("app://"), None);
/// ```
pub fn validate_deep_link_scheme(scheme: &str) -> Option<&str> {
    let mut chars = scheme.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return None,
    }

    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}

/// Validates a provider route identifier.
///
/// Provider ids end up in URL paths and in `uid` prefixes, so they are
/// restricted to lowercase ASCII letters, digits, `-` and `_`. The `:`
/// separator used by `uid` composition is never allowed.
pub fn validate_provider_id(id: &str) -> Option<&str> {
    if id.is_empty() {
        return None;
    }

    if id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'))
    {
        Some(id)
    } else {
        None
    }
}
