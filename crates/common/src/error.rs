//! Error types for aspirez-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Broad classification of an [`AppError`].
///
/// Callers use this to decide whether a request may be retried: only
/// [`ErrorKind::Transient`] is eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before touching the store.
    Validation,
    /// Duplicate email/username, duplicate active edge, already verified.
    Conflict,
    /// Unknown OTP, unknown account, no active edge.
    NotFound,
    /// Self-referential or same-as-old requests.
    Precondition,
    /// Credential or token failures.
    Authentication,
    /// The acting or target account is not allowed to take part.
    Forbidden,
    /// Store timeouts and unreachable store.
    Transient,
    /// Everything else that is the server's fault.
    Internal,
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Validation ===
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    // === Conflict ===
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Already following this user")]
    AlreadyFollowing,

    #[error("Account is already verified")]
    AlreadyVerified,

    // === Not found ===
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid or expired OTP")]
    OtpNotFound,

    #[error("Not following this user")]
    NotFollowing,

    // === Precondition ===
    #[error("Cannot follow or unfollow yourself")]
    SelfFollow,

    #[error("New password cannot be the same as the old password")]
    SamePassword,

    // === Authentication ===
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    // === Forbidden ===
    #[error("Account is banned")]
    AccountBanned,

    #[error("Registration is incomplete, verify your email first")]
    RegistrationIncomplete,

    #[error("Follower account is not active: {0}")]
    InactiveFollower(String),

    #[error("Followee account is not active: {0}")]
    InactiveFollowee(String),

    // === Server Errors ===
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Password comparison failed: {0}")]
    ComparisonError(String),

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidId(_) => ErrorKind::Validation,
            Self::DuplicateEmail(_)
            | Self::DuplicateUsername(_)
            | Self::AlreadyFollowing
            | Self::AlreadyVerified => ErrorKind::Conflict,
            Self::AccountNotFound(_) | Self::OtpNotFound | Self::NotFollowing => {
                ErrorKind::NotFound
            }
            Self::SelfFollow | Self::SamePassword => ErrorKind::Precondition,
            Self::InvalidCredentials
            | Self::Unauthorized
            | Self::TokenExpired
            | Self::TokenInvalid(_) => ErrorKind::Authentication,
            Self::AccountBanned
            | Self::RegistrationIncomplete
            | Self::InactiveFollower(_)
            | Self::InactiveFollowee(_) => ErrorKind::Forbidden,
            Self::StoreUnavailable(_) => ErrorKind::Transient,
            Self::Database(_)
            | Self::HashingError(_)
            | Self::ComparisonError(_)
            | Self::EmailDelivery(_)
            | Self::Config(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Precondition => StatusCode::PRECONDITION_FAILED,
            ErrorKind::Transient | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidId(_) => "INVALID_ID",
            Self::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            Self::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            Self::AlreadyFollowing => "ALREADY_FOLLOWING",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::OtpNotFound => "OTP_NOT_FOUND",
            Self::NotFollowing => "NOT_FOLLOWING",
            Self::SelfFollow => "SELF_FOLLOW",
            Self::SamePassword => "SAME_PASSWORD",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid(_) => "TOKEN_INVALID",
            Self::AccountBanned => "ACCOUNT_BANNED",
            Self::RegistrationIncomplete => "REGISTRATION_INCOMPLETE",
            Self::InactiveFollower(_) => "INACTIVE_FOLLOWER",
            Self::InactiveFollowee(_) => "INACTIVE_FOLLOWEE",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::HashingError(_) => "HASHING_ERROR",
            Self::ComparisonError(_) => "COMPARISON_ERROR",
            Self::EmailDelivery(_) => "EMAIL_DELIVERY_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether the caller may retry the same request.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient)
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "status": "error",
            "error": self.to_string(),
            "code": code,
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        Self::Validation(err.body_text())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
