//! Dashboard endpoint.

use axum::{Json, Router, extract::State, routing::post};
use govboard_common::AppResult;
use govboard_core::DashboardSummary;
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryRequest {
    pub institution: Option<String>,
}

/// Headline counts for the caller's view.
async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> AppResult<ApiResponse<DashboardSummary>> {
    let summary = state
        .dashboard_service
        .summary(&auth.scope(), req.institution.as_deref())
        .await?;
    Ok(ApiResponse::ok(summary))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/summary", post(summary))
}
