//! Account and session endpoints.

use aspirez_common::AppResult;
use aspirez_core::{AccountSummary, CreateAccountInput, IssuedSession};
use axum::{
    Router,
    extract::{Path, State},
    routing::{post, put},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::{AuthUser, JsonBody},
    middleware::AppState,
    response::ApiResponse,
};

/// Request carrying only an email address.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[validate(email, length(max = 256))]
    pub email: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Reset-password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub otp: String,
    #[serde(alias = "newPassword")]
    pub password: String,
}

/// Change-password request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Username availability request.
#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

/// Username availability response.
#[derive(Serialize)]
pub struct UsernameAvailability {
    pub available: bool,
}

/// Register a new account. The verification OTP only leaves by email.
async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateAccountInput>,
) -> AppResult<ApiResponse<AccountSummary>> {
    let outcome = state.account_service.create_account(req).await?;

    Ok(ApiResponse::ok(outcome.account))
}

/// Confirm an email address.
async fn verify(
    State(state): State<AppState>,
    Path(otp): Path<String>,
) -> AppResult<ApiResponse<AccountSummary>> {
    let account = state.account_service.verify_account(&otp).await?;

    Ok(ApiResponse::ok(account))
}

async fn resend_verification(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EmailRequest>,
) -> AppResult<ApiResponse<()>> {
    req.validate()?;
    state.account_service.resend_verification(&req.email).await?;

    Ok(ApiResponse::empty())
}

async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EmailRequest>,
) -> AppResult<ApiResponse<()>> {
    req.validate()?;
    state
        .account_service
        .request_password_reset(&req.email)
        .await?;

    Ok(ApiResponse::empty())
}

async fn reset_password(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .account_service
        .consume_password_reset(&req.otp, &req.password)
        .await?;

    Ok(ApiResponse::empty())
}

async fn change_password(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .account_service
        .change_password(user.id(), &req.old_password, &req.new_password)
        .await?;

    Ok(ApiResponse::empty())
}

async fn username_available(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UsernameRequest>,
) -> AppResult<ApiResponse<UsernameAvailability>> {
    let available = state
        .account_service
        .is_username_available(&req.username)
        .await?;

    Ok(ApiResponse::ok(UsernameAvailability { available }))
}

/// Exchange credentials for a session token.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<ApiResponse<IssuedSession>> {
    let session = state
        .session_service
        .authenticate(&req.email, &req.password)
        .await?;

    Ok(ApiResponse::ok(session))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verify/{otp}", post(verify))
        .route("/resend-verification", post(resend_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/change-password", put(change_password))
        .route("/username-available", post(username_available))
        .route("/login", post(login))
}
