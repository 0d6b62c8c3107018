use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;

/// Header carrying the authenticated username, set by the authorizer in
/// front of this service. Everything behind it trusts the claim as-is.
pub const USERNAME_HEADER: &str = "x-auth-username";

#[derive(Clone, Debug)]
pub struct AuthUser(pub String);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USERNAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|username| !username.is_empty())
            .map(|username| AuthUser(username.to_owned()))
            .ok_or(AppError::Unauthorized)
    }
}
