//! API middleware.

#![allow(missing_docs)]

use aspirez_common::AppError;
use aspirez_core::{AccountService, ConnectionService, SessionService};
use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub session_service: SessionService,
    pub connection_service: ConnectionService,
}

impl AppState {
    #[must_use]
    pub const fn new(
        account_service: AccountService,
        session_service: SessionService,
        connection_service: ConnectionService,
    ) -> Self {
        Self {
            account_service,
            session_service,
            connection_service,
        }
    }
}

/// Why a presented token was not accepted.
///
/// Stored in the request extensions so only routes that need a session
/// reject it; public routes ignore a stale header.
#[derive(Debug, Clone)]
pub enum TokenRejection {
    Expired,
    Invalid(String),
}

impl TokenRejection {
    #[must_use]
    pub fn to_error(&self) -> AppError {
        match self {
            Self::Expired => AppError::TokenExpired,
            Self::Invalid(reason) => AppError::TokenInvalid(reason.clone()),
        }
    }
}

impl From<AppError> for TokenRejection {
    fn from(err: AppError) -> Self {
        match err {
            AppError::TokenExpired => Self::Expired,
            AppError::TokenInvalid(reason) => Self::Invalid(reason),
            other => Self::Invalid(other.to_string()),
        }
    }
}

/// Verifies a `Bearer` token when one is sent.
///
/// Valid claims are stored in the request extensions for [`crate::extractors::AuthUser`];
/// a failed check stores a [`TokenRejection`] instead. A request without a
/// token passes through untouched.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.session_service.verify_token(token.trim()) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
                req.extensions_mut().insert(TokenRejection::from(e));
            }
        }
    }

    next.run(req).await
}
