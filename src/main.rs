//! Dermalens server binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dermalens::{create_router, ml::ModelLoader, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "dermalens=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!("Dermalens v{} starting...", dermalens::constants::APP_VERSION);
    tracing::info!("Model path: {}", config.model_path.display());
    tracing::info!("Prediction log: {}", config.prediction_log_path.display());

    let loader = ModelLoader::onnx(config.model_path.clone());
    let state = AppState::new(config.clone(), loader);

    if config.preload_model {
        let loader = Arc::clone(&state.model);
        match tokio::task::spawn_blocking(move || loader.get()).await {
            Ok(Ok(_)) => tracing::info!("Model preloaded"),
            Ok(Err(e)) => tracing::warn!("Model preload failed, requests will report it: {}", e),
            Err(e) => tracing::warn!("Model preload task failed: {}", e),
        }
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
