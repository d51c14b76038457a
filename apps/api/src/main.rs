mod assessment;
mod config;
mod corpus;
mod errors;
mod llm_client;
mod retrieval;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::corpus::chunker::{Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::llm_client::LlmClient;
use crate::retrieval::embedder::GoogleEmbedder;
use crate::retrieval::index::build_index_state;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Wellnest assessment API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.llm_timeout_secs);

    // Initialize LLM client
    let llm = LlmClient::new(config.groq_api_key.clone(), timeout)?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build the corpus index before accepting traffic. A failure here is logged
    // and the server still starts; /analyze then answers 500.
    let embedder = Arc::new(GoogleEmbedder::new(config.google_api_key.clone(), timeout)?);
    let chunker = Chunker::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)?;
    let index = build_index_state(
        &config.corpus_dir,
        &config.corpus_file,
        &chunker,
        embedder,
    )
    .await;
    info!("Index state: {}", index.label());

    let state = AppState {
        llm: Arc::new(llm),
        index: Arc::new(index),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origin)?);
    info!("CORS origin: {}", config.allowed_origin);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
