//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use govboard_common::AppResult;
use serde::Serialize;

/// Standard API response wrapper: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Degrade a failed listing read to an empty list.
///
/// Only store failures are swallowed; authorization and validation errors
/// still reach the client.
pub fn list_or_empty<T>(result: AppResult<Vec<T>>, listing: &'static str) -> AppResult<Vec<T>> {
    match result {
        Err(e) if e.is_store_failure() => {
            tracing::warn!(listing, error = %e, "Listing read failed, returning empty result");
            Ok(Vec::new())
        }
        other => other,
    }
}
