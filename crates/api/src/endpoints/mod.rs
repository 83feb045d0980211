//! API endpoints.
//!
//! Every route is a `POST` with a JSON body, grouped by record kind.

mod auth;
mod dashboard;
mod groups;
mod institutions;
mod projects;
mod users;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/projects", projects::router())
        .nest("/votes", votes::router())
        .nest("/institutions", institutions::router())
        .nest("/users", users::router())
        .nest("/groups", groups::router())
        .nest("/dashboard", dashboard::router())
}
