use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torrentforge_api::config::ServerConfig;
use torrentforge_api::engine::processor::JobProcessor;
use torrentforge_api::router::build_app_router;
use torrentforge_api::state::AppState;
use torrentforge_core::builder::{MktorrentBuilder, ToolStatus};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "torrentforge_api=debug,torrentforge_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_dir = %config.data_dir.display(),
        "Loaded server configuration",
    );

    // --- Creation tool ---
    let builder = Arc::new(MktorrentBuilder::new(config.builder_bin.clone()));
    if builder.is_available() {
        tracing::info!(tool = builder.tool(), "Creation tool found");
    } else {
        tracing::warn!(
            tool = builder.tool(),
            "Creation tool not found, tasks will fail until it is installed",
        );
    }

    // --- App state ---
    let state = AppState::open(config.clone(), builder.clone()).await;

    // --- Job processor ---
    let max_workers = state.settings.get().await.max_workers;
    let processor = Arc::new(JobProcessor::new(&state, builder, max_workers));
    let processor_cancel = CancellationToken::new();
    let processor_handle = tokio::spawn(processor.run(processor_cancel.clone()));

    // --- Router ---
    let app = build_app_router(state.clone(), &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    processor_cancel.cancel();
    if tokio::time::timeout(Duration::from_secs(10), processor_handle)
        .await
        .is_err()
    {
        tracing::warn!("Job processor did not stop in time");
    }

    if let Err(e) = state.tasks.flush().await {
        tracing::error!(error = %e, "Failed to flush task store");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
