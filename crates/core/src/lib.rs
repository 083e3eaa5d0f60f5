//! Functional core for authbridge.
//!
//! Everything in this crate is free of network I/O: data types, pure
//! functions, error taxonomies and the collaborator traits that the
//! `authbridge_auth` crate implements or consumes.

pub mod auth;
pub mod identity;
