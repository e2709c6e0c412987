//! forkd admin console server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use forkd_api::{middleware::AppState, router as api_router};
use forkd_common::Config;
use forkd_core::{AssignmentService, AuthService, ComplaintService, ModerationEngines};
use forkd_db::repositories::{
    AdminSessionRepository, AuditRecordRepository, ComplaintRepository, DeliveryOrderRepository,
    SubjectRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forkd=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting forkd admin server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = forkd_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    forkd_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Initialize repositories
    let subject_repo = SubjectRepository::new(Arc::clone(&db));
    let audit_repo = AuditRecordRepository::new(Arc::clone(&db));
    let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
    let order_repo = DeliveryOrderRepository::new(Arc::clone(&db));
    let session_repo = AdminSessionRepository::new(Arc::clone(&db));

    // Initialize services
    let moderation = ModerationEngines::new(&subject_repo, &audit_repo);
    let complaint_service = ComplaintService::new(complaint_repo, moderation.clone());
    let assignment_service = AssignmentService::new(order_repo, subject_repo);
    let auth_service = AuthService::new(session_repo, config.admin.clone());

    let state = AppState {
        moderation,
        complaint_service,
        assignment_service,
        auth_service,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            forkd_api::middleware::auth_middleware,
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
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
