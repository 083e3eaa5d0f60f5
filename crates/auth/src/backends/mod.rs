//! Identity backend implementations.
//!
//! The production identity store lives outside the broker behind
//! `IdentityBackend`; `LocalBackend` is the self-contained implementation
//! used for single-node deployments and tests.

mod local;

pub use local::{CustomTokenClaims, LocalBackend};
