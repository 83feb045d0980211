//! User group endpoints.

use axum::{Json, Router, extract::State, routing::post};
use govboard_common::AppResult;
use govboard_core::{CreateGroupInput, UpdateGroupInput};
use govboard_db::{entities::user_group, repositories::UserGroupFilter};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, list_or_empty},
};

/// Group response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_ids: Vec<String>,
    pub created_at: String,
}

impl From<user_group::Model> for GroupResponse {
    fn from(g: user_group::Model) -> Self {
        let user_ids = g.member_ids();
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            user_ids,
            created_at: g.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListGroupsRequest {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    pub group_id: String,
    #[serde(flatten)]
    pub input: UpdateGroupInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGroupRequest {
    pub group_id: String,
}

async fn list(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListGroupsRequest>,
) -> AppResult<ApiResponse<Vec<GroupResponse>>> {
    let filter = UserGroupFilter { search: req.search };
    let groups = list_or_empty(state.group_service.list(&filter).await, "groups")?;
    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state.group_service.create(&auth.scope(), input).await?;
    Ok(ApiResponse::ok(group.into()))
}

async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateGroupRequest>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state
        .group_service
        .update(&auth.scope(), &req.group_id, req.input)
        .await?;
    Ok(ApiResponse::ok(group.into()))
}

async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteGroupRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .group_service
        .delete(&auth.scope(), &req.group_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
