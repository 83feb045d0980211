//! govboard server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use govboard_api::{AppState, auth_middleware, router as api_router};
use govboard_common::{Config, config::LogFormat};
use govboard_core::{
    DashboardService, InstitutionService, ProjectService, UserGroupService, UserService,
    VoteService,
};
use govboard_db::repositories::{
    InstitutionRepository, ProjectRepository, UserGroupRepository, UserRepository,
    VoteRecordRepository,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body; every payload is a small JSON object.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "govboard=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration decides the log format, so it loads first
    let config = Config::load()?;
    init_tracing(config.logging.format);

    info!("Starting govboard server...");

    let db = govboard_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    govboard_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let institution_repo = InstitutionRepository::new(Arc::clone(&db));
    let project_repo = ProjectRepository::new(Arc::clone(&db));
    let group_repo = UserGroupRepository::new(Arc::clone(&db));
    let vote_repo = VoteRecordRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let institution_service = InstitutionService::new(institution_repo.clone(), &config);
    let project_service = ProjectService::new(project_repo.clone());
    let group_service = UserGroupService::new(group_repo);
    let vote_service = VoteService::new(project_repo.clone(), vote_repo.clone(), &config);
    let dashboard_service =
        DashboardService::new(project_repo, institution_repo, user_repo, vote_repo);

    // Seed an empty store
    institution_service.ensure_headquarters().await?;
    if let Some(bootstrap) = &config.bootstrap {
        user_service
            .ensure_bootstrap_admin(bootstrap, institution_service.headquarters())
            .await?;
    }

    let state = AppState {
        user_service,
        institution_service,
        project_service,
        group_service,
        vote_service,
        dashboard_service,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
