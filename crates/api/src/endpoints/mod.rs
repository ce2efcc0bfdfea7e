//! API endpoints.

mod auth;
mod connections;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
///
/// Routes are relative; the server nests them under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/connections", connections::router())
        .nest("/users", users::router())
}
