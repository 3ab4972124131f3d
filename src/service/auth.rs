//! Bearer-token authentication for the room API
//!
//! The token is an opaque capability handed out at user creation; the
//! extractor resolves it through the user directory so handlers always see
//! an authenticated user.

use crate::service::app::ApiContext;
use crate::types::UserProfile;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};

/// An authenticated caller, resolved from the `Authorization` header
pub struct AuthUser {
    pub user: UserProfile,
    pub token: String,
}

impl FromRequestParts<ApiContext> for AuthUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiContext,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization"))?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or((StatusCode::UNAUTHORIZED, "Authorization must be Bearer"))?;

        let user = state
            .directory
            .resolve(token)
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed"))?
            .ok_or((StatusCode::NOT_FOUND, "Unknown user"))?;

        Ok(Self {
            user,
            token: token.to_string(),
        })
    }
}
