use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::memory::ConversationMemory;
use crate::rag::embeddings::Embedder;
use crate::rag::vector_store::VectorStore;
use crate::storage::DocumentArchive;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Bookings and document metadata.
    pub db: PgPool,
    /// Conversation turns and booking drafts, per session.
    pub memory: ConversationMemory,
    pub vectors: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub llm: LlmClient,
    /// Present only when `S3_BUCKET` is configured.
    pub archive: Option<DocumentArchive>,
    pub config: Config,
}
