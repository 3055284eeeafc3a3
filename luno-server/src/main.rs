use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use chrono::Duration;
use luno_server::{
    api,
    config::Settings,
    db::Database,
    media::{DiskMediaStore, UPLOADS_ROUTE},
    session::SessionManager,
    state::AppState,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "luno_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load settings
    let settings = Settings::new().expect("Failed to load settings");

    // Initialize database
    let db = Database::new(&settings.database.path).expect("Failed to create database");

    db.initialize()
        .expect("Failed to initialize database schema");

    tracing::info!("Database initialized successfully");

    let session_manager =
        SessionManager::with_ttl(db.clone(), Duration::days(settings.session.ttl_days));
    let media = Arc::new(DiskMediaStore::new(&settings.media.upload_dir));
    let state = AppState::new(db, session_manager, media);

    // Run initial session cleanup on startup
    match state.session_manager.cleanup_expired_sessions() {
        Ok(count) if count > 0 => tracing::info!("Cleaned up {} expired sessions on startup", count),
        Ok(_) => tracing::info!("No expired sessions to clean up"),
        Err(e) => tracing::error!("Failed to cleanup expired sessions on startup: {}", e),
    }

    // Start background task for periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600)); // Run every hour
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic session cleanup...");
            match cleanup_state.session_manager.cleanup_expired_sessions() {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!("Periodic cleanup: removed {} expired sessions", count);
                    }
                }
                Err(e) => {
                    tracing::error!("Periodic session cleanup failed: {}", e);
                }
            }
        }
    });

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = api::router(state)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&settings.media.upload_dir));

    if let Some(static_dir) = &settings.server.static_dir {
        tracing::info!("Serving web client from {}", static_dir);
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    let app = app
        .layer(DefaultBodyLimit::max(settings.media.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .expect("Failed to parse server address");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
