//! WasteWatch server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, middleware};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wastewatch_api::{AppState, auth_middleware, router as api_router};
use wastewatch_common::{Config, IdGenerator, LocalStorage};
use wastewatch_core::{EmailService, MediaService, ReportService, UserService};
use wastewatch_db::repositories::{UserRepository, WasteReportRepository};

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wastewatch=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting wastewatch server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = wastewatch_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    wastewatch_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let report_repo = WasteReportRepository::new(Arc::clone(&db));

    // Initialize media storage
    let storage_path = PathBuf::from(&config.storage.base_path);
    let storage = Arc::new(LocalStorage::new(
        storage_path.clone(),
        config.storage.base_url.clone(),
    ));
    let media_service = MediaService::new(storage, &config.storage);

    // Initialize services
    let id_gen = IdGenerator::new();
    let user_service = UserService::new(user_repo.clone(), id_gen.clone());
    let report_service =
        ReportService::new(report_repo, user_repo, media_service.clone(), id_gen);

    let frontend_base = config
        .server
        .frontend_url
        .clone()
        .unwrap_or_else(|| config.server.url.clone());
    let email_service = EmailService::new(&config.email, frontend_base)?;
    if email_service.is_enabled() {
        info!("Outgoing email enabled");
    } else {
        info!("SMTP not configured; password-reset links will be logged");
    }

    let state = AppState {
        report_service,
        user_service,
        email_service,
        media_service,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .nest_service(
            config.storage.base_url.trim_end_matches('/'),
            ServeDir::new(&storage_path),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(config.storage.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
