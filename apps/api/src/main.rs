mod booking;
mod config;
mod db;
mod errors;
mod extractors;
mod ingest;
mod llm_client;
mod memory;
mod models;
mod rag;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::memory::ConversationMemory;
use crate::rag::embeddings::{Embedder, OpenAiEmbedder};
use crate::rag::vector_store::{QdrantVectorStore, VectorStore};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::DocumentArchive;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let memory = ConversationMemory::new(redis, Duration::from_secs(config.session_ttl_secs));
    info!("Redis client initialized");

    // Initialize embeddings and Qdrant
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
    let vectors: Arc<dyn VectorStore> = Arc::new(QdrantVectorStore::new(
        &config.qdrant_url,
        config.qdrant_api_key.clone(),
        config.qdrant_collection.clone(),
    )?);
    vectors
        .ensure_collection(embedder.dimensions())
        .await
        .context("Failed to prepare Qdrant collection")?;
    info!(
        "Vector store ready (collection: {}, embedding model: {})",
        config.qdrant_collection,
        embedder.model()
    );

    // Initialize LLM client
    let llm = LlmClient::new(&config.llm)?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize S3 / MinIO archive when configured
    let archive = match &config.s3 {
        Some(s3) => {
            info!("Archiving uploads to bucket {}", s3.bucket);
            Some(DocumentArchive::new(s3).await)
        }
        None => None,
    };

    // Build app state
    let state = AppState {
        db,
        memory,
        vectors,
        embedder,
        llm,
        archive,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
