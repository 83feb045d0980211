//! User endpoints.

use axum::{Json, Router, extract::State, routing::post};
use govboard_common::AppResult;
use govboard_core::{CreateUserInput, UpdateUserInput};
use govboard_db::{
    entities::user::{self, UserRole},
    repositories::UserFilter,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, list_or_empty},
};

/// Public view of a user. Credentials never leave the server.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub job_title: Option<String>,
    pub institution: String,
    pub accessible_institutions: Vec<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        let accessible_institutions = u.accessible_institution_names();
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            avatar_url: u.avatar_url,
            job_title: u.job_title,
            institution: u.institution,
            accessible_institutions,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersRequest {
    pub search: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub input: UpdateUserInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    pub user_id: String,
}

/// Users visible to the caller.
async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListUsersRequest>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let scope = auth.scope();
    let filter = UserFilter {
        search: req.search,
        institution: req.institution,
    };

    let users = list_or_empty(state.user_service.list(&scope, &filter).await, "users")?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let created = state
        .user_service
        .create(&auth.scope(), input)
        .await?;
    Ok(ApiResponse::ok(created.into()))
}

async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state
        .user_service
        .update(&auth.scope(), &req.user_id, req.input)
        .await?;
    Ok(ApiResponse::ok(updated.into()))
}

async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteUserRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .user_service
        .delete(&auth.scope(), &req.user_id)
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
