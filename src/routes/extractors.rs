// ============================================================================
// Axum Extractors
// ============================================================================
//
// - UserId: sender identity from the X-User-ID header. Authentication happens
//   upstream; this service only trusts the gateway-provided header.
//
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller's user id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::validation("missing X-User-ID header"))?
            .to_str()
            .map_err(|_| AppError::validation("X-User-ID header is not valid ASCII"))?;

        let user_id: i64 = raw
            .trim()
            .parse()
            .map_err(|_| AppError::validation("X-User-ID must be an integer"))?;
        if user_id <= 0 {
            return Err(AppError::validation("X-User-ID must be a positive integer"));
        }
        Ok(UserId(user_id))
    }
}
