//! Credential provider — hands out the bearer token for authenticated backend calls.
//!
//! Components that call the backend receive an `Arc<dyn CredentialProvider>`
//! explicitly; nothing reads a token from ambient/global state.

use axum::http::{header::AUTHORIZATION, HeaderMap};

pub trait CredentialProvider: Send + Sync {
    /// The bearer token to present, or `None` if the caller is anonymous.
    fn bearer_token(&self) -> Option<String>;
}

/// A token captured once, typically from the incoming request.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Extracts `Authorization: Bearer <token>` from request headers.
/// Returns `None` when the header is absent, malformed, or the token is blank.
pub fn token_from_headers(headers: &HeaderMap) -> Option<StaticToken> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(StaticToken(token.to_string()))
    }
}
