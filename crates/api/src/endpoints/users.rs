//! Public user endpoints.

use aspirez_common::AppResult;
use aspirez_core::UserSummary;
use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};

use crate::{middleware::AppState, response::ApiResponse};

async fn followers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let followers = state.connection_service.list_followers(&id).await?;

    Ok(ApiResponse::ok(followers))
}

async fn following(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let following = state.connection_service.list_followees(&id).await?;

    Ok(ApiResponse::ok(following))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/followers", get(followers))
        .route("/{id}/following", get(following))
}
