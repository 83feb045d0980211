//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use govboard_common::AppResult;
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Signin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Sign in with email and password.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let (user, token) = state.user_service.signin(&req.email, &req.password).await?;

    Ok(ApiResponse::ok(SigninResponse {
        user: user.into(),
        token,
    }))
}

/// Invalidate the caller's token.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.signout(&user.id).await?;
    Ok(ApiResponse::ok(()))
}

/// The authenticated caller.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/i", post(me))
}
