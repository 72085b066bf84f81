use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{
    dto::admin::Claims, error::AppError, services::admin_service::active_session, state::AppState,
};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone)]
pub struct AdminUser {
    pub username: String,
    pub role: String,
}

pub fn ensure_admin(user: &AdminUser) -> Result<(), AppError> {
    if user.role != ADMIN_ROLE {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        let claims = decode_token(token, &state.config.admin.jwt_secret)?;

        // Logging out or logging in again retires older tokens.
        active_session(&state.storage)
            .await
            .filter(|session| session.token == token)
            .ok_or_else(|| AppError::Unauthorized("Session has ended".into()))?;

        let user = AdminUser {
            username: claims.sub,
            role: claims.role,
        };
        ensure_admin(&user)?;
        Ok(user)
    }
}
