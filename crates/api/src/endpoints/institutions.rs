//! Institution endpoints.

use axum::{Json, Router, extract::State, routing::post};
use govboard_common::AppResult;
use govboard_core::{CreateInstitutionInput, UpdateInstitutionInput};
use govboard_db::{
    entities::institution::{self, InstitutionStatus},
    repositories::InstitutionFilter,
};
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, list_or_empty},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInstitutionsRequest {
    pub search: Option<String>,
    pub status: Option<InstitutionStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionIdRequest {
    pub institution_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstitutionRequest {
    pub institution_id: String,
    #[serde(flatten)]
    pub input: UpdateInstitutionInput,
}

/// All institutions, ordered by name.
async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListInstitutionsRequest>,
) -> AppResult<ApiResponse<Vec<institution::Model>>> {
    let filter = InstitutionFilter {
        search: req.search,
        status: req.status,
    };
    let institutions = state.institution_service.list(&filter).await;
    Ok(ApiResponse::ok(list_or_empty(institutions, "institutions")?))
}

/// Names for the institution picker, headquarters first.
async fn names(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<String>>> {
    let names = state.institution_service.picker_names(&auth.scope()).await;
    Ok(ApiResponse::ok(list_or_empty(names, "institution names")?))
}

async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateInstitutionInput>,
) -> AppResult<ApiResponse<institution::Model>> {
    let created = state
        .institution_service
        .create(&auth.scope(), input)
        .await?;
    Ok(ApiResponse::ok(created))
}

async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateInstitutionRequest>,
) -> AppResult<ApiResponse<institution::Model>> {
    let updated = state
        .institution_service
        .update(&auth.scope(), &req.institution_id, req.input)
        .await?;
    Ok(ApiResponse::ok(updated))
}

/// Flip between active and inactive.
async fn toggle(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<InstitutionIdRequest>,
) -> AppResult<ApiResponse<institution::Model>> {
    let toggled = state
        .institution_service
        .toggle(&auth.scope(), &req.institution_id)
        .await?;
    Ok(ApiResponse::ok(toggled))
}

async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<InstitutionIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .institution_service
        .delete(&auth.scope(), &req.institution_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/names", post(names))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/toggle", post(toggle))
        .route("/delete", post(delete))
}
