use axum::ServiceExt;
use axum::extract::Request;
use server_http::{AppState, build_service};
use shared::config::Config;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting cache server");

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env()?;

    // ============================================
    // STEP 1: Build the configured backend
    // ============================================
    // Credentials are validated here; a bad key stops startup.
    let backend = storage_engine::build_backend(&config.backend)?;

    // ============================================
    // STEP 2: Serve HTTP
    // ============================================
    let state = AppState::new(backend, config.limits).with_request_timeout(config.request_timeout);
    let service = build_service(state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        "HTTP server listening on http://{} (backend: {})",
        config.bind_address(),
        config.backend.name()
    );

    axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Cache server shut down");
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
