//! Request extractors.

use aspirez_common::AppError;
use aspirez_core::SessionClaims;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

use crate::middleware::TokenRejection;

/// JSON body extractor whose rejections use the error envelope.
///
/// Malformed or incomplete bodies become [`AppError::Validation`].
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Authenticated session extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionClaims);

impl AuthUser {
    /// The authenticated user's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0.sub
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        if let Some(claims) = parts.extensions.get::<SessionClaims>() {
            return Ok(Self(claims.clone()));
        }

        Err(parts
            .extensions
            .get::<TokenRejection>()
            .map_or(AppError::Unauthorized, TokenRejection::to_error))
    }
}
