//! Follow graph endpoints for the signed-in user.

use aspirez_common::AppResult;
use aspirez_core::UserSummary;
use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, JsonBody},
    middleware::AppState,
    response::ApiResponse,
};

/// Follow/unfollow request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRequest {
    pub user_id: String,
}

/// Follow a user. Returns the caller's followees.
async fn follow(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TargetRequest>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let following = state
        .connection_service
        .follow(user.id(), &req.user_id)
        .await?;

    Ok(ApiResponse::ok(following))
}

/// Unfollow a user. Returns the caller's followees.
async fn unfollow(
    user: AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TargetRequest>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let following = state
        .connection_service
        .unfollow(user.id(), &req.user_id)
        .await?;

    Ok(ApiResponse::ok(following))
}

async fn followers(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let followers = state.connection_service.list_followers(user.id()).await?;

    Ok(ApiResponse::ok(followers))
}

async fn following(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let following = state.connection_service.list_followees(user.id()).await?;

    Ok(ApiResponse::ok(following))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow", post(follow))
        .route("/unfollow", post(unfollow))
        .route("/followers", get(followers))
        .route("/following", get(following))
}
