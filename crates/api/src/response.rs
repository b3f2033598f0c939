//! Standardized JSON response envelope.
//!
//! Every endpoint responds with the same shape:
//!
//! ```json
//! { "success": true,  "data": { ... }, "meta": { ... } }
//! { "success": false, "error": { "message": "...", "code": "..." } }
//! ```
//!
//! List endpoints carry pagination in `meta`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Response metadata (pagination and friends).
#[derive(Debug, Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Pagination metadata for list endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Build pagination metadata from a page request and total row count.
    #[must_use]
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response wrapping `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    /// A 200 response wrapping `data` with pagination metadata.
    #[must_use]
    pub const fn paginated(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            meta: Some(Meta {
                message: None,
                pagination: Some(pagination),
            }),
        }
    }

    /// A 201 Created response wrapping `data`.
    #[must_use]
    pub fn created(data: T) -> Created<T> {
        Created(Self::ok(data))
    }

    /// A 200 response with a human-readable message and no payload body
    /// beyond `data`.
    #[must_use]
    pub const fn with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data,
            meta: Some(Meta {
                message: Some(message),
                pagination: None,
            }),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Wrapper that responds with `201 Created`.
#[derive(Debug)]
pub struct Created<T>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// Error payload embedded in the envelope by [`crate::error::ApiError`].
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Error detail inside [`ErrorBody`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ErrorBody {
    /// Build an error envelope.
    #[must_use]
    pub const fn new(message: String, code: Option<&'static str>) -> Self {
        Self {
            success: false,
            error: ErrorDetail { message, code },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_envelope_shape() {
        let body = ApiResponse::ok(json!({"id": 1}));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn test_paginated_envelope_shape() {
        let body = ApiResponse::paginated(json!([]), Pagination::new(2, 10, 35));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "success": true,
                "data": [],
                "meta": {
                    "pagination": {"page": 2, "limit": 10, "total": 35, "total_pages": 4}
                }
            })
        );
    }

    #[test]
    fn test_pagination_rounds_up() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
        assert_eq!(Pagination::new(1, 10, 11).total_pages, 2);
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorBody::new("Not found".to_string(), Some("NOT_FOUND"));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "error": {"message": "Not found", "code": "NOT_FOUND"}
            })
        );
    }
}
