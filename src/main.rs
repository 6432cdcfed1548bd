//! GlucoGuard AI Engine - Main Entry Point

use glucogard::config::DEFAULT_CONFIG_PATH;
use glucogard::{build_router, AppState, EngineConfig, ModelArtifact, RiskPipeline};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("CONFIG_PATH")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let loaded = EngineConfig::load(&config_path);
    let config = loaded.as_ref().cloned().unwrap_or_default().with_env_overrides();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("GlucoGuard AI Engine v{}", env!("CARGO_PKG_VERSION"));
    if let Err(e) = &loaded {
        tracing::warn!("Config {} not loaded ({}), using defaults", config_path, e);
    }

    // No artifact, no service
    let artifact = match ModelArtifact::load(&config.model_path) {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::error!("Failed to load model artifact: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(RiskPipeline::new(Arc::new(artifact)));
    let app = build_router(state, config.cors_permissive);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Risk engine listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
