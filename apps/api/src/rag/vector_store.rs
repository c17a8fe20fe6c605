use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, vectors_config, Condition, CreateCollectionBuilder,
    DeletePointsBuilder, Distance, Filter, PointId, PointStruct, ScoredPoint, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const SCROLL_PAGE: u32 = 1000;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] qdrant_client::QdrantError),

    #[error("Chunks ({chunks}) and vectors ({vectors}) must have same length")]
    LengthMismatch { chunks: usize, vectors: usize },
}

/// Metadata shared by every chunk of one uploaded document.
#[derive(Debug, Clone)]
pub struct ChunkMetadata {
    pub source: String,
    pub document_id: Uuid,
    pub strategy: String,
    pub total_chunks: usize,
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub source: Option<String>,
    /// Every payload field except `text`.
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// Storage and nearest-neighbour search over chunk embeddings.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection, recreating it when the vector size differs.
    async fn ensure_collection(&self, dimensions: usize) -> Result<(), VectorStoreError>;

    /// Stores chunks with their vectors; returns one generated point id per chunk.
    async fn upsert_chunks(
        &self,
        chunks: &[String],
        vectors: &[Vec<f32>],
        metadata: &ChunkMetadata,
    ) -> Result<Vec<String>, VectorStoreError>;

    /// Returns up to `top_k` hits. `score_threshold` applies only when positive.
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Deletes every chunk whose `source` is the given file name.
    async fn delete_by_source(&self, source: &str) -> Result<usize, VectorStoreError>;

    /// Deletes every chunk of one uploaded document.
    async fn delete_by_document(&self, document_id: Uuid) -> Result<usize, VectorStoreError>;
}

/// Qdrant vector store implementation.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
}

impl QdrantVectorStore {
    pub fn new(
        url: &str,
        api_key: Option<String>,
        collection: String,
    ) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        Ok(Self {
            client: builder.build()?,
            collection,
        })
    }

    async fn current_vector_size(&self) -> Result<Option<u64>, VectorStoreError> {
        let info = self.client.collection_info(self.collection.clone()).await?;
        Ok(info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| match v.config {
                Some(vectors_config::Config::Params(p)) => Some(p.size),
                _ => None,
            }))
    }

    async fn create_collection(&self, dimensions: usize) -> Result<(), VectorStoreError> {
        info!(
            "Creating collection '{}' with vector size {}",
            self.collection, dimensions
        );
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(dimensions as u64, Distance::Cosine),
                ),
            )
            .await?;
        Ok(())
    }

    /// Scrolls all point ids matching `filter`, then deletes them by id.
    async fn delete_matching(&self, filter: Filter) -> Result<usize, VectorStoreError> {
        let mut ids: Vec<PointId> = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut scroll = ScrollPointsBuilder::new(&self.collection)
                .filter(filter.clone())
                .limit(SCROLL_PAGE)
                .with_payload(false)
                .with_vectors(false);
            if let Some(next) = offset.take() {
                scroll = scroll.offset(next);
            }
            let page = self.client.scroll(scroll).await?;
            ids.extend(page.result.into_iter().filter_map(|p| p.id));
            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        if ids.is_empty() {
            return Ok(0);
        }

        let count = ids.len();
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(ids)
                    .wait(true),
            )
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, dimensions: usize) -> Result<(), VectorStoreError> {
        if !self.client.collection_exists(self.collection.clone()).await? {
            return self.create_collection(dimensions).await;
        }

        match self.current_vector_size().await? {
            Some(size) if size == dimensions as u64 => {
                info!("Collection '{}' ready (size: {})", self.collection, size);
                Ok(())
            }
            other => {
                warn!(
                    "Wrong vector size detected ({:?} != {}). Recreating collection '{}'...",
                    other, dimensions, self.collection
                );
                self.client.delete_collection(self.collection.clone()).await?;
                self.create_collection(dimensions).await
            }
        }
    }

    async fn upsert_chunks(
        &self,
        chunks: &[String],
        vectors: &[Vec<f32>],
        metadata: &ChunkMetadata,
    ) -> Result<Vec<String>, VectorStoreError> {
        if chunks.len() != vectors.len() {
            return Err(VectorStoreError::LengthMismatch {
                chunks: chunks.len(),
                vectors: vectors.len(),
            });
        }
        if chunks.is_empty() {
            warn!("No chunks to save");
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(chunks.len());
        let mut points = Vec::with_capacity(chunks.len());
        for (idx, (chunk, vector)) in chunks.iter().zip(vectors).enumerate() {
            let id = Uuid::new_v4().to_string();
            points.push(PointStruct::new(
                id.clone(),
                vector.clone(),
                chunk_payload(chunk, idx, metadata),
            ));
            ids.push(id);
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await?;

        info!(
            "Saved {} vectors for '{}' to Qdrant",
            ids.len(),
            metadata.source
        );
        Ok(ids)
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let mut request =
            SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k as u64)
                .with_payload(true);
        if score_threshold > 0.0 {
            request = request.score_threshold(score_threshold);
        }

        let response = self.client.search_points(request).await?;
        let hits: Vec<SearchHit> = response.result.into_iter().map(to_hit).collect();

        info!("Qdrant search returned {} results", hits.len());
        Ok(hits)
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize, VectorStoreError> {
        let deleted = self
            .delete_matching(Filter::must([Condition::matches(
                "source",
                source.to_string(),
            )]))
            .await?;
        info!("Deleted {deleted} points from source '{source}'");
        Ok(deleted)
    }

    async fn delete_by_document(&self, document_id: Uuid) -> Result<usize, VectorStoreError> {
        let deleted = self
            .delete_matching(Filter::must([Condition::matches(
                "document_id",
                document_id.to_string(),
            )]))
            .await?;
        info!("Deleted {deleted} points for document {document_id}");
        Ok(deleted)
    }
}

fn chunk_payload(
    chunk: &str,
    chunk_index: usize,
    metadata: &ChunkMetadata,
) -> HashMap<String, QdrantValue> {
    let mut payload: HashMap<String, QdrantValue> = HashMap::new();
    payload.insert("text".to_string(), chunk.to_string().into());
    payload.insert("source".to_string(), metadata.source.clone().into());
    payload.insert(
        "document_id".to_string(),
        metadata.document_id.to_string().into(),
    );
    payload.insert("strategy".to_string(), metadata.strategy.clone().into());
    payload.insert(
        "total_chunks".to_string(),
        (metadata.total_chunks as i64).into(),
    );
    payload.insert("chunk_index".to_string(), (chunk_index as i64).into());
    payload
}

fn to_hit(point: ScoredPoint) -> SearchHit {
    let id = match point.id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Num(num)) => num.to_string(),
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        None => String::new(),
    };

    let mut meta = serde_json::Map::new();
    let mut text = String::new();
    for (key, value) in point.payload {
        if key == "text" {
            text = value.as_str().cloned().unwrap_or_default();
        } else {
            meta.insert(key, value.into());
        }
    }
    let source = meta
        .get("source")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    SearchHit {
        id,
        score: point.score,
        text,
        source,
        meta,
    }
}
