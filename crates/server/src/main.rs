//! enrol-rs server entry point.

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware};
use enrol_api::{AppState, auth_middleware, router as api_router};
use enrol_common::{AppError, Config, SessionKeys};
use enrol_core::{
    AccessService, EnrolRegistry, EnrolmentStore, ManualEnrolMethod, SelfEnrolMethod,
    SelfEnrolmentService, SettingsTestService, UnenrolmentService, UserService,
};
use enrol_db::repositories::{
    CourseGroupRepository, CourseRepository, EnrolInstanceRepository, RoleAssignmentRepository,
    UserEnrolmentRepository, UserRepository,
};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
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

/// Wire repositories, enrolment methods and services into the app state.
fn build_state(db: &Arc<DatabaseConnection>, config: &Config) -> AppState {
    let session_keys = SessionKeys::new(&config.security.session_secret);

    let user_repo = UserRepository::new(Arc::clone(db));
    let course_repo = CourseRepository::new(Arc::clone(db));
    let instance_repo = EnrolInstanceRepository::new(Arc::clone(db));
    let enrolment_repo = UserEnrolmentRepository::new(Arc::clone(db));
    let group_repo = CourseGroupRepository::new(Arc::clone(db));
    let role_repo = RoleAssignmentRepository::new(Arc::clone(db));

    // Enrolment methods, resolved once at startup
    let store = EnrolmentStore::new(enrolment_repo.clone(), group_repo.clone());
    let self_method = Arc::new(SelfEnrolMethod::new(
        instance_repo.clone(),
        store.clone(),
        config.enrol.self_enrol.clone(),
    ));
    let registry = Arc::new(
        EnrolRegistry::from_config(&config.enrol)
            .with(self_method.clone())
            .with(Arc::new(ManualEnrolMethod::new(store))),
    );
    info!(?registry, "Enrolment methods registered");

    let access = AccessService::new(role_repo, enrolment_repo.clone());

    AppState {
        user_service: UserService::new(user_repo.clone(), session_keys.clone()),
        self_enrolment_service: SelfEnrolmentService::new(
            course_repo.clone(),
            instance_repo.clone(),
            group_repo,
            access.clone(),
            Arc::clone(&registry),
            self_method,
        ),
        unenrolment_service: UnenrolmentService::new(
            enrolment_repo,
            user_repo,
            instance_repo,
            course_repo,
            access,
            Arc::clone(&registry),
            session_keys,
        ),
        settings_test_service: SettingsTestService::new(registry),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "enrol=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting enrol-rs server...");

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;
    if config.security.session_secret.trim().is_empty() {
        return Err(AppError::Config("security.session_secret must be set".to_string()).into());
    }

    // Connect to database
    let db = enrol_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    enrol_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let state = build_state(&db, &config);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
