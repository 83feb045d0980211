//! Vote history endpoints.

use axum::{Json, Router, extract::State, routing::post};
use govboard_common::AppResult;
use govboard_db::{
    entities::vote_record::{self, VoteType},
    repositories::VoteHistoryFilter,
};
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, list_or_empty},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub user_name: Option<String>,
    pub institution: Option<String>,
    pub item_name: Option<String>,
    pub vote_type: Option<VoteType>,
}

impl From<HistoryRequest> for VoteHistoryFilter {
    fn from(req: HistoryRequest) -> Self {
        Self {
            user_name: req.user_name,
            institution: req.institution,
            item_name: req.item_name,
            vote_type: req.vote_type,
        }
    }
}

/// Ledger rows, newest first. Members see only their own.
async fn history(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<HistoryRequest>,
) -> AppResult<ApiResponse<Vec<vote_record::Model>>> {
    let records = state
        .vote_service
        .list_history(&auth.scope(), &req.into())
        .await;
    Ok(ApiResponse::ok(list_or_empty(records, "vote history")?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/history", post(history))
}
