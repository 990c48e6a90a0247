//! Gridwatch server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use gridwatch_api::{
    StreamingPublisher, StreamingState, middleware::AppState, router as api_router,
    streaming_handler,
};
use gridwatch_common::config::ServerConfig;
use gridwatch_common::{Config, GeocodingResolver, MediaStore};
use gridwatch_core::{NotificationService, OutageReportService, ReportExporter};
use gridwatch_db::repositories::{
    NotificationRepository, OutageReportRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
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

/// Bind address from the configured host and port.
fn bind_addr(server: &ServerConfig) -> Result<SocketAddr, std::net::AddrParseError> {
    Ok(SocketAddr::new(server.host.parse()?, server.port))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridwatch=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting gridwatch server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = gridwatch_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    gridwatch_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Initialize repositories
    let report_repo = OutageReportRepository::new(db.clone());
    let notification_repo = NotificationRepository::new(db.clone());
    let user_repo = UserRepository::new(db.clone());

    // Initialize streaming and services
    let streaming = StreamingState::new();
    let event_publisher = Arc::new(StreamingPublisher::new(streaming.clone()));

    let notification_service = NotificationService::new(notification_repo, user_repo.clone());
    let report_service = OutageReportService::new(
        report_repo.clone(),
        notification_service.clone(),
        GeocodingResolver::new(&config.geocoding),
        MediaStore::new(&config.media),
        event_publisher,
    );
    let exporter = ReportExporter::new(report_repo);

    let state = AppState {
        report_service,
        notification_service,
        exporter,
        user_repo,
        streaming,
    };

    // Build router. Stored media is served as static files next to the API.
    let app = Router::new()
        .route("/streaming", get(streaming_handler))
        .nest("/api", api_router())
        .nest_service(
            config.media.base_url.as_str(),
            ServeDir::new(&config.media.root),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gridwatch_api::middleware::auth_middleware,
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
    let addr = bind_addr(&config.server)?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_uses_the_configured_host() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 4000,
            url: "http://localhost:4000".to_string(),
        };

        assert_eq!(bind_addr(&server).unwrap().to_string(), "127.0.0.1:4000");
        assert!(bind_addr(&ServerConfig { host: "not-an-ip".to_string(), ..server }).is_err());
    }
}
