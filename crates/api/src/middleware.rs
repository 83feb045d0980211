//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use govboard_core::{
    DashboardService, InstitutionService, ProjectService, UserGroupService, UserService,
    VoteService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub institution_service: InstitutionService,
    pub project_service: ProjectService,
    pub group_service: UserGroupService,
    pub vote_service: VoteService,
    pub dashboard_service: DashboardService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Unknown tokens simply leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_store_failure() => {
                tracing::warn!(error = %e, "Token lookup failed");
            }
            Err(_) => {}
        }
    }

    next.run(req).await
}
