//! HTTP API layer for aspirez-rs.
//!
//! Thin adapter over the core services:
//!
//! - **Endpoints**: signup, verification, password flows, login and the follow graph
//! - **Extractors**: The authenticated session
//! - **Middleware**: Bearer token verification
//! - **Response**: The `{status, data?, error?}` envelope
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
pub use response::ApiResponse;
