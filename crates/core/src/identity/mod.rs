mod error;
mod functions;
mod traits;
mod types;

pub use error::{BackendError, BackendResult};
pub use functions::{
    claims_for_profile, compose_uid, new_identity_from_profile, UID_SEPARATOR,
};
pub use traits::IdentityBackend;
pub use types::{Credential, CredentialClaims, CredentialToken, InternalIdentity, NewIdentity};
