use starter_service::{build_router, config::AppConfig, services::Database, services::JwtService, AppState};

use service_core::error::AppError;
use service_core::middleware::audit::{AuditSink, AuditState};
use service_core::observability::audit_trail::AuditTrail;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AppConfig::from_env()?;

    init_tracing(&config.log_level);

    // Rotating audit trail; the handle is kept for explicit teardown
    let trail = Arc::new(AuditTrail::init(&config.audit_log)?);

    tracing::info!(
        service = %config.service_name,
        environment = ?config.environment,
        "Starting service"
    );

    let db = Arc::new(Database::new(&config.database).await?);
    db.run_migrations().await?;
    tracing::info!("Database initialized successfully");

    let jwt = JwtService::new(&config.jwt);
    tracing::info!("JWT service initialized");

    let sink: Arc<dyn AuditSink> = db.clone();
    let audit = AuditState::new(sink, trail.clone());

    let state = AppState {
        config: Arc::new(config.clone()),
        jwt,
        users: db.clone(),
        audit,
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    trail.shutdown();
    tracing::info!("Service shutdown complete");
    Ok(())
}

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
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
