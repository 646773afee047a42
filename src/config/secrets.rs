//! Secret handling utilities.
//!
//! Re-exports secrecy types and builds the bearer header value for the
//! configured API token without leaking it into logs.

pub use secrecy::{ExposeSecret, SecretString};

/// `Authorization` header value for a bearer token.
pub fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}
