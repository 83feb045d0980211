//! API integration tests.
//!
//! Requests go through the real router and auth middleware against a mock
//! database; query results are consumed in the order the handlers issue them.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use govboard_api::{AppState, auth_middleware, router as api_router};
use govboard_common::config::{
    Config, DatabaseConfig, GovernanceConfig, LoggingConfig, ServerConfig,
};
use govboard_core::{
    DashboardService, InstitutionService, ProjectService, UserGroupService, UserService,
    VoteService,
};
use govboard_db::{
    entities::{
        institution::{self, InstitutionStatus},
        project::{self, ProjectStatus},
        user::{self, UserRole},
    },
    repositories::{
        InstitutionRepository, ProjectRepository, UserGroupRepository, UserRepository,
        VoteRecordRepository,
    },
};
use http_body_util::BodyExt;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test configuration.
fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 10,
            acquire_timeout_secs: 10,
        },
        governance: GovernanceConfig::default(),
        bootstrap: None,
        logging: LoggingConfig::default(),
    }
}

/// Create test app state over one shared connection.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);
    let config = create_test_config();

    let user_repo = UserRepository::new(Arc::clone(&db));
    let institution_repo = InstitutionRepository::new(Arc::clone(&db));
    let project_repo = ProjectRepository::new(Arc::clone(&db));
    let group_repo = UserGroupRepository::new(Arc::clone(&db));
    let vote_repo = VoteRecordRepository::new(Arc::clone(&db));

    AppState {
        user_service: UserService::new(user_repo.clone()),
        institution_service: InstitutionService::new(institution_repo.clone(), &config),
        project_service: ProjectService::new(project_repo.clone()),
        group_service: UserGroupService::new(group_repo),
        vote_service: VoteService::new(project_repo.clone(), vote_repo.clone(), &config),
        dashboard_service: DashboardService::new(
            project_repo,
            institution_repo,
            user_repo,
            vote_repo,
        ),
    }
}

/// Create the test router with authentication wired in.
fn create_test_router(db: DatabaseConnection) -> Router {
    let state = create_test_state(db);
    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn create_test_user(id: &str, role: UserRole, accessible: &[&str]) -> user::Model {
    user::Model {
        id: id.to_string(),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        password_hash: "not-a-real-hash".to_string(),
        role,
        avatar_url: None,
        job_title: None,
        institution: accessible.first().copied().unwrap_or("North").to_string(),
        accessible_institutions: json!(accessible),
        token: Some(format!("token-{id}")),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn create_test_project(id: &str, institution: &str) -> project::Model {
    project::Model {
        id: id.to_string(),
        user_id: "admin1".to_string(),
        institution: institution.to_string(),
        name: format!("Project {id}"),
        status: ProjectStatus::InProgress,
        progress: 40,
        description: None,
        responsible_name: None,
        config_name: None,
        start_date: None,
        end_date: None,
        votes_up: 1,
        votes_down: 0,
        user_votes: json!({"u1": {"type": "up", "userName": "Ana"}}),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn create_test_institution(id: &str, name: &str) -> institution::Model {
    institution::Model {
        id: id.to_string(),
        name: name.to_string(),
        status: InstitutionStatus::Active,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_projects_require_authentication() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/projects/list", None, json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/i", Some("stale"), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signin_unknown_email() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post(
            "/signin",
            None,
            json!({"email": "nobody@example.com", "password": "secret1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_hides_credentials() {
    let member = create_test_user("m1", UserRole::Member, &["North"]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/i", Some("token-m1"), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], "m1");
    assert_eq!(body["data"]["accessibleInstitutions"], json!(["North"]));
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("token").is_none());
}

#[tokio::test]
async fn test_member_lists_visible_projects() {
    let member = create_test_user("m1", UserRole::Member, &["North"]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .append_query_results([vec![create_test_project("p1", "North")]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/projects/list", Some("token-m1"), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let projects = body["data"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["status"], "IN_PROGRESS");
    assert_eq!(projects[0]["votes"]["up"], 1);
    assert_eq!(projects[0]["votes"]["userVotes"]["u1"]["type"], "up");
}

#[tokio::test]
async fn test_member_without_institutions_gets_empty_list() {
    let member = create_test_user("m1", UserRole::Member, &[]);
    // No project query is issued for an empty scope
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/projects/list", Some("token-m1"), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}

#[tokio::test]
async fn test_list_degrades_on_store_failure() {
    let admin = create_test_user("admin1", UserRole::Admin, &[]);
    // The listing query finds the result buffer exhausted and fails
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![admin]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/projects/list", Some("token-admin1"), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}

#[tokio::test]
async fn test_member_cannot_create_project() {
    let member = create_test_user("m1", UserRole::Member, &["North"]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post(
            "/projects/create",
            Some("token-m1"),
            json!({"name": "Bridge", "institution": "North"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_vote_on_missing_project() {
    let member = create_test_user("m1", UserRole::Member, &["North"]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .append_query_results([Vec::<project::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post(
            "/projects/vote",
            Some("token-m1"),
            json!({"projectId": "missing", "voteType": "up"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "PROJECT_NOT_FOUND");
}

#[tokio::test]
async fn test_vote_on_invisible_project() {
    let member = create_test_user("m1", UserRole::Member, &["North"]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .append_query_results([vec![create_test_project("p1", "South")]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post(
            "/projects/vote",
            Some("token-m1"),
            json!({"projectId": "p1", "voteType": "down"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_vote_type_is_rejected() {
    let member = create_test_user("m1", UserRole::Member, &["North"]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post(
            "/projects/vote",
            Some("token-m1"),
            json!({"projectId": "p1", "voteType": "sideways"}),
        ))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let admin = create_test_user("admin1", UserRole::Admin, &[]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![admin]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post(
            "/users/delete",
            Some("token-admin1"),
            json!({"userId": "admin1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_member_picker_omits_headquarters() {
    let member = create_test_user("m1", UserRole::Member, &["North"]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![member]])
        .append_query_results([vec![
            create_test_institution("i1", "Headquarters"),
            create_test_institution("i2", "South"),
            create_test_institution("i3", "North"),
        ]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/institutions/names", Some("token-m1"), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!(["North", "South"]));
}

#[tokio::test]
async fn test_unknown_route_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post("/projects/archive", None, json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
