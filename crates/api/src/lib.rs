//! HTTP API layer for govboard.
//!
//! A thin axum adapter over the core services:
//!
//! - **Endpoints**: JSON routes for projects, votes, institutions, users and groups
//! - **Extractors**: the authenticated caller and its access scope
//! - **Middleware**: bearer-token authentication
//!
//! Authorization is decided by the services; handlers only translate.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
