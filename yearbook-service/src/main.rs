use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use yearbook_service::{
    build_router,
    config::AppConfig,
    db,
    services::{AuthService, Database, DriveService, JwtService, MediaStorage, YearbookStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AppConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting yearbook service"
    );

    // Storage handle: constructed here, injected everywhere via AppState.
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
    let store: Arc<dyn YearbookStore> = Arc::new(Database::new(pool.clone()));
    tracing::info!("Database initialized successfully");

    let jwt = JwtService::new(&config.jwt);

    let drive = DriveService::new(&config.drive);
    if drive.is_configured() {
        tracing::info!("Drive client initialized");
    } else {
        tracing::warn!(
            "Drive credentials not configured - photo upload and the image proxy will fail"
        );
    }
    let media: Arc<dyn MediaStorage> = Arc::new(drive);

    let auth_service = AuthService::new(
        store.clone(),
        jwt.clone(),
        config.jwt.refresh_token_expiry_days,
    );

    let signin_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.signin_attempts,
        config.rate_limit.signin_window_seconds,
    );
    let signup_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.signup_attempts,
        config.rate_limit.signup_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );

    let state = AppState {
        config: config.clone(),
        store,
        jwt,
        media,
        auth_service,
        signin_rate_limiter,
        signup_rate_limiter,
        ip_rate_limiter,
    };

    let app = build_router(state).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Drain the pool so in-flight statements finish before exit.
    pool.close().await;
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
