use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated identity extracted from the `Authorization: Bearer <token>`
/// header of an access credential.
///
/// Add this as a handler parameter to require authentication. This is
/// identity only; authorization decisions happen in the kernel against a
/// resolved `Actor`.
pub struct AuthUser {
    pub user_id: i32,
    pub role: String,
    pub permissions: Vec<String>,
    pub token_id: Uuid,
    /// Expiry of the presented token (unix seconds); logout uses it as the
    /// revocation marker's lifetime.
    pub expires_at: i64,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify_access(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        if state.revoked.is_revoked(&claims.token_id) {
            return Err(AppError::TokenRevoked);
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            role: claims.role,
            permissions: claims.permissions,
            token_id: claims.token_id,
            expires_at: claims.exp,
        })
    }
}

/// A `Json<T>` wrapper that converts deserialization errors into
/// `AppError::Validation`, ensuring clients always receive structured JSON
/// error responses.
pub struct AppJson<T>(pub T);

impl<T> FromRequest<AppState> for AppJson<T>
where
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::Validation(e.body_text()))?;
        Ok(AppJson(value))
    }
}
