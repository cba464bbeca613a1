use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use suggestor_api::config::ServerConfig;
use suggestor_api::router::build_app_router;
use suggestor_api::state::AppState;

/// Connect timeout for outbound calls to the wiki.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "suggestor_api=debug,suggestor_wiki=debug,suggestor_db=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        bind_address = %config.bind_address,
        base_path = %config.base_path,
        "Loaded server configuration"
    );

    // --- Key-value store ---
    let store = suggestor_db::connect(&config.redis_url)
        .await
        .expect("Failed to connect to key-value store");
    suggestor_db::health_check(&*store)
        .await
        .expect("Key-value store health check failed");
    tracing::info!("Key-value store health check passed");

    // --- HTTP client ---
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client");

    // --- App state + router ---
    let state = AppState::new(config.clone(), store, client);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("Failed to bind to address");
    tracing::info!(addr = %config.bind_address, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
