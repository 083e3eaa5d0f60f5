mod error;
mod functions;
mod traits;
mod types;
mod validation;

pub use error::AuthError;
pub use functions::{
    build_authorize_url, generate_state, is_pkce_expired, truncate_for_log, STATE_LEN,
};
pub use traits::{PkceStore, ProviderClient, Result};
pub use types::{
    AccessToken, ExternalProfile, PkceGrant, PkceSession, ProviderKind, TokenAuthMethod,
};
pub use validation::{validate_deep_link_scheme, validate_provider_id};
