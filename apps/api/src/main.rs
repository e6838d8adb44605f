mod analysis;
mod config;
mod document;
mod errors;
mod llm_client;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::EnvBackendFactory;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resumatch API v{}", env!("CARGO_PKG_VERSION"));

    // Shared HTTP client for every provider adapter. The per-stage deadline is
    // enforced separately; this only bounds a single connection.
    let http = reqwest::Client::builder()
        .timeout(config.llm.timeout)
        .build()
        .context("failed to build HTTP client")?;

    match config.llm.provider {
        Some(kind) => info!(
            "LLM provider pinned to {kind} (model: {})",
            config.llm.model.as_deref().unwrap_or(kind.default_model())
        ),
        None => info!("LLM_PROVIDER not set; backend is chosen per request from available credentials"),
    }

    let backends = Arc::new(EnvBackendFactory::new(config.llm.clone(), http));

    let state = AppState {
        config: config.clone(),
        backends,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
