//! API response types.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{"status": "success", "data": ...}`, always 200.
///
/// Errors take the same shape with `"status": "error"` and are rendered
/// by [`aspirez_common::AppError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            status: "success",
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success without a payload.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            status: "success",
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(ApiResponse::ok(json!({"id": "x"}))).unwrap();
        assert_eq!(body, json!({"status": "success", "data": {"id": "x"}}));
    }

    #[test]
    fn test_empty_omits_data() {
        let body = serde_json::to_value(ApiResponse::empty()).unwrap();
        assert_eq!(body, json!({"status": "success"}));
    }

    #[test]
    fn test_success_status() {
        let response = ApiResponse::ok(1).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
