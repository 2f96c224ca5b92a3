//! Bearer token extraction

use crate::api::state::AppState;
use crate::core::error::GateError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

/// Caller identity resolved from the `Authorization: Bearer` header.
///
/// Handlers that take an `AuthUser` argument only run for requests carrying
/// a valid, unexpired token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            tracing::debug!("Missing or malformed Authorization header");
            GateError::InvalidToken
        })?;

        let username = state.auth.identify(token)?;
        Ok(AuthUser { username })
    }
}

/// Extract the token from `Authorization: Bearer <token>`; scheme is case-insensitive
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
