//! Request extractors.
//!
//! - [`auth::AuthUser`] -- The caller identity forwarded by the gateway.

pub mod auth;
