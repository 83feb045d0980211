//! Project endpoints, including voting.

use axum::{Json, Router, extract::State, routing::post};
use govboard_common::AppResult;
use govboard_core::{
    CastVoteInput, CreateProjectInput, ProjectDetail, ReconcileOutcome, UpdateProjectInput,
    VoteAggregate,
};
use govboard_db::{
    entities::{
        project::{self, ProjectStatus},
        vote_record::{self, VoteType},
    },
    repositories::ProjectFilter,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, list_or_empty},
};

// ==================== Request/Response Types ====================

/// Vote aggregate as embedded in a project.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotesResponse {
    pub up: i32,
    pub down: i32,
    pub user_votes: serde_json::Value,
}

/// Project response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub user_id: String,
    pub institution: String,
    pub name: String,
    pub status: ProjectStatus,
    pub progress: i32,
    pub description: Option<String>,
    pub responsible_name: Option<String>,
    pub config_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub votes: VotesResponse,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<project::Model> for ProjectResponse {
    fn from(p: project::Model) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            institution: p.institution,
            name: p.name,
            status: p.status,
            progress: p.progress,
            description: p.description,
            responsible_name: p.responsible_name,
            config_name: p.config_name,
            start_date: p.start_date.map(|d| d.to_string()),
            end_date: p.end_date.map(|d| d.to_string()),
            votes: VotesResponse {
                up: p.votes_up,
                down: p.votes_down,
                user_votes: p.user_votes,
            },
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Project with resolved voter names.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub approvers: Vec<String>,
    pub disapprovers: Vec<String>,
}

impl From<ProjectDetail> for ProjectDetailResponse {
    fn from(detail: ProjectDetail) -> Self {
        Self {
            project: detail.project.into(),
            approvers: detail.approvers,
            disapprovers: detail.disapprovers,
        }
    }
}

/// Result of a cast vote.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub record: vote_record::Model,
    pub votes: VoteAggregate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsRequest {
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
    pub institution: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdRequest {
    pub project_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub project_id: String,
    #[serde(flatten)]
    pub input: UpdateProjectInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub project_id: String,
    pub vote_type: VoteType,
}

// ==================== Handlers ====================

/// Projects visible to the caller, newest first.
async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListProjectsRequest>,
) -> AppResult<ApiResponse<Vec<ProjectResponse>>> {
    let filter = ProjectFilter {
        search: req.search,
        status: req.status,
        institution: req.institution,
    };

    let projects = list_or_empty(
        state.project_service.list(&auth.scope(), &filter).await,
        "projects",
    )?;
    Ok(ApiResponse::ok(projects.into_iter().map(Into::into).collect()))
}

async fn show(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ProjectIdRequest>,
) -> AppResult<ApiResponse<ProjectDetailResponse>> {
    let detail = state
        .project_service
        .get(&auth.scope(), &req.project_id)
        .await?;
    Ok(ApiResponse::ok(detail.into()))
}

async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> AppResult<ApiResponse<ProjectResponse>> {
    let project = state.project_service.create(&auth.scope(), input).await?;
    Ok(ApiResponse::ok(project.into()))
}

async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProjectRequest>,
) -> AppResult<ApiResponse<ProjectResponse>> {
    let project = state
        .project_service
        .update(&auth.scope(), &req.project_id, req.input)
        .await?;
    Ok(ApiResponse::ok(project.into()))
}

async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ProjectIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .project_service
        .delete(&auth.scope(), &req.project_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Cast a vote as the caller.
async fn vote(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    let scope = auth.scope();
    let AuthUser(user) = auth;

    let input = CastVoteInput {
        item_id: req.project_id,
        user_id: user.id,
        user_name: user.name,
        user_avatar: user.avatar_url,
        vote_type: req.vote_type,
    };

    let outcome = state.vote_service.cast_vote(&scope, input).await?;
    Ok(ApiResponse::ok(VoteResponse {
        record: outcome.record,
        votes: outcome.aggregate,
    }))
}

async fn reconcile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ProjectIdRequest>,
) -> AppResult<ApiResponse<ReconcileOutcome>> {
    let outcome = state
        .vote_service
        .reconcile(&auth.scope(), &req.project_id)
        .await?;
    Ok(ApiResponse::ok(outcome))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/vote", post(vote))
        .route("/reconcile", post(reconcile))
}
