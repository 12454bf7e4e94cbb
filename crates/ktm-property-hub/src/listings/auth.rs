use axum::http::{header, HeaderMap};

use super::domain::Principal;

/// Resolves a bearer credential to the calling principal.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authentication required")]
    MissingCredentials,
    #[error("malformed authorization header")]
    MalformedHeader,
    #[error("invalid or expired credentials")]
    InvalidCredentials,
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(Some(token.trim()))
}

/// Authenticates when a credential is present; anonymous callers get `None`.
pub fn optional_principal<A>(auth: &A, headers: &HeaderMap) -> Result<Option<Principal>, AuthError>
where
    A: Authenticator + ?Sized,
{
    bearer_token(headers)?
        .map(|token| auth.authenticate(token))
        .transpose()
}

pub fn require_principal<A>(auth: &A, headers: &HeaderMap) -> Result<Principal, AuthError>
where
    A: Authenticator + ?Sized,
{
    optional_principal(auth, headers)?.ok_or(AuthError::MissingCredentials)
}
