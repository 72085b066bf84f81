use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

pub const CART_SESSION_HEADER: &str = "x-cart-session";

/// Client-chosen cart identifier taken from the `x-cart-session` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSession(pub Uuid);

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CART_SESSION_HEADER)
            .ok_or_else(|| AppError::bad_request("Missing x-cart-session header"))?
            .to_str()
            .map_err(|_| AppError::bad_request("Invalid x-cart-session header"))?;

        Uuid::parse_str(raw.trim())
            .map(CartSession)
            .map_err(|_| AppError::bad_request("x-cart-session must be a UUID"))
    }
}
