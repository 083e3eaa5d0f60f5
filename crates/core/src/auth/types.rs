use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Provider families the broker knows how to talk to.
///
/// The family fixes how the token request authenticates and whether the
/// authorize step is bound with PKCE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Client secret sent in the form body, no PKCE.
    Discord,
    /// HTTP basic client credentials plus a PKCE verifier.
    X,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discord => write!(f, "discord"),
            Self::X => write!(f, "x"),
        }
    }
}

/// How the token endpoint expects the client to authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAuthMethod {
    /// `client_id` and `client_secret` as form fields.
    ClientSecretPost,
    /// `Authorization: Basic` with the client credentials.
    ClientSecretBasic,
}

/// A stored PKCE verifier, keyed by its `state`.
#[derive(Clone, Serialize, Deserialize)]
pub struct PkceSession {
    pub state: String,
    pub code_verifier: String,
    pub created_at: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
}

impl std::fmt::Debug for PkceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceSession")
            .field("state", &self.state)
            .field("code_verifier", &"[redacted]")
            .field("created_at", &self.created_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Output of a PKCE store `create` call.
///
/// `state` goes into the authorize URL next to `challenge`; `verifier` is
/// only needed at token exchange and is already held by the store.
#[derive(Clone)]
pub struct PkceGrant {
    pub state: String,
    pub verifier: String,
    pub challenge: String,
}

impl std::fmt::Debug for PkceGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceGrant")
            .field("state", &self.state)
            .field("verifier", &"[redacted]")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Bearer token returned by a provider's token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([redacted])")
    }
}

/// Provider profile normalized into a provider-agnostic shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProfile {
    pub provider_id: String,
    /// Provider-assigned, immutable user identifier.
    pub external_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Ok(Duration::seconds(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_display_is_lowercase() {
        assert_eq!(ProviderKind::Discord.to_string(), "discord");
        assert_eq!(ProviderKind::X.to_string(), "x");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let token = AccessToken::new("T1".to_string());
        assert!(!format!("{:?}", token).contains("T1"));

        let grant = PkceGrant {
            state: "s1".to_string(),
            verifier: "V1-very-secret".to_string(),
            challenge: "c".to_string(),
        };
        let debug = format!("{:?}", grant);
        assert!(debug.contains("s1"));
        assert!(!debug.contains("V1-very-secret"));

        let session = PkceSession {
            state: "s1".to_string(),
            code_verifier: "V1-very-secret".to_string(),
            created_at: Utc::now(),
            ttl: Duration::minutes(10),
        };
        assert!(!format!("{:?}", session).contains("V1-very-secret"));
    }

    #[test]
    fn pkce_session_serializes_ttl_as_seconds() {
        let session = PkceSession {
            state: "s1".to_string(),
            code_verifier: "V1".to_string(),
            created_at: Utc::now(),
            ttl: Duration::minutes(10),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["ttl"], 600);

        let back: PkceSession = serde_json::from_value(json).unwrap();
        assert_eq!(back.ttl, Duration::minutes(10));
    }
}
