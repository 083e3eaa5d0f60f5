use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable internal identity of a person signed in through a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalIdentity {
    /// `"<provider_id>:<external_id>"`.
    pub uid: String,
    pub provider_id: String,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields used to create an identity on first sight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIdentity {
    pub provider_id: String,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Claims embedded in a minted credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Opaque token produced by the signing backend.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken(String);

impl CredentialToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialToken([redacted])")
    }
}

/// A credential minted for one login. Never stored by the broker.
#[derive(Debug, Clone)]
pub struct Credential {
    pub uid: String,
    pub provider_id: String,
    pub claims: CredentialClaims,
    pub token: CredentialToken,
    pub issued_at: DateTime<Utc>,
}
