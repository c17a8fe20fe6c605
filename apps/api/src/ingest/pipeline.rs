//! Background indexing of uploaded documents: extract, chunk, embed, store.

use bytes::Bytes;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ingest::chunker::{chunk_text, ChunkStrategy};
use crate::ingest::extract::{extract_text, ExtractError, FileKind};
use crate::ingest::repository::{mark_failed, mark_ready};
use crate::rag::embeddings::{Embedder, EmbeddingError};
use crate::rag::vector_store::{ChunkMetadata, VectorStore, VectorStoreError};
use crate::state::AppState;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("No text extracted")]
    NoText,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store failed: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// An uploaded file waiting to be indexed.
pub struct Upload {
    pub document_id: Uuid,
    pub file_name: String,
    pub kind: FileKind,
    pub bytes: Bytes,
    pub strategy: ChunkStrategy,
}

#[derive(Debug)]
pub struct IndexedDocument {
    pub vector_ids: Vec<String>,
    pub text_preview: String,
}

/// Extracts and chunks the upload, then stores one vector per chunk.
pub async fn index_document(
    embedder: &dyn Embedder,
    vectors: &dyn VectorStore,
    upload: &Upload,
) -> Result<IndexedDocument, PipelineError> {
    let text = extract_text(upload.kind, upload.bytes.clone()).await?;
    if text.trim().is_empty() {
        return Err(PipelineError::NoText);
    }

    let chunks = chunk_text(&text, upload.strategy);
    if chunks.is_empty() {
        return Err(PipelineError::NoText);
    }
    info!("Created {} chunks from {}", chunks.len(), upload.file_name);

    let embeddings = embedder.embed_batch(&chunks).await?;
    info!("Generated {} embeddings", embeddings.len());

    let metadata = ChunkMetadata {
        source: upload.file_name.clone(),
        document_id: upload.document_id,
        strategy: upload.strategy.as_str().to_string(),
        total_chunks: chunks.len(),
    };
    let vector_ids = vectors.upsert_chunks(&chunks, &embeddings, &metadata).await?;

    Ok(IndexedDocument {
        vector_ids,
        text_preview: text.trim().chars().take(PREVIEW_CHARS).collect(),
    })
}

/// Runs [`index_document`] and records the outcome on the document row.
/// Meant to be spawned; every failure is logged and persisted, never propagated.
pub async fn process_document(state: AppState, upload: Upload) {
    let document_id = upload.document_id;
    let outcome = index_document(state.embedder.as_ref(), state.vectors.as_ref(), &upload).await;

    let recorded = match outcome {
        Ok(indexed) => {
            info!(
                "Indexed {} ({}): {} chunks",
                upload.file_name,
                document_id,
                indexed.vector_ids.len()
            );
            let updated = mark_ready(
                &state.db,
                document_id,
                &indexed.vector_ids,
                &indexed.text_preview,
            )
            .await;
            if let Ok(false) = updated {
                discard_orphaned_vectors(state.vectors.as_ref(), document_id).await;
            }
            updated.map(|_| ())
        }
        Err(e) => {
            warn!("Error processing file {}: {e}", upload.file_name);
            mark_failed(&state.db, document_id, &e.to_string()).await
        }
    };

    if let Err(e) = recorded {
        error!("Failed to record processing result for document {document_id}: {e}");
    }
}

/// Removes the vectors of a document whose row was deleted while it was
/// being indexed.
async fn discard_orphaned_vectors(vectors: &dyn VectorStore, document_id: Uuid) {
    match vectors.delete_by_document(document_id).await {
        Ok(removed) => {
            info!("Document {document_id} was deleted during indexing; removed {removed} vectors")
        }
        Err(e) => error!("Failed to remove vectors of deleted document {document_id}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::answer::testing::{CannedStore, FixedEmbedder};

    fn upload(kind: FileKind, body: impl Into<Bytes>, strategy: ChunkStrategy) -> Upload {
        Upload {
            document_id: Uuid::new_v4(),
            file_name: "resume.txt".to_string(),
            kind,
            bytes: body.into(),
            strategy,
        }
    }

    #[tokio::test]
    async fn test_index_text_document() {
        let body: &'static [u8] = b"Experience\n\nRust engineer at Acme.\n\nSkills\n\nTokio, Axum, SQL.";
        let indexed = index_document(
            &FixedEmbedder,
            &CannedStore::default(),
            &upload(FileKind::Txt, body, ChunkStrategy::Paragraph),
        )
        .await
        .unwrap();

        assert_eq!(indexed.vector_ids.len(), 1);
        assert!(indexed.text_preview.starts_with("Experience"));
    }

    #[tokio::test]
    async fn test_blank_document_is_rejected() {
        let err = index_document(
            &FixedEmbedder,
            &CannedStore::default(),
            &upload(FileKind::Txt, &b"  \n\n \t"[..], ChunkStrategy::Fixed),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::NoText));
        assert_eq!(err.to_string(), "No text extracted");
    }

    #[tokio::test]
    async fn test_corrupt_docx_fails_extraction() {
        let err = index_document(
            &FixedEmbedder,
            &CannedStore::default(),
            &upload(FileKind::Docx, &b"not a zip archive"[..], ChunkStrategy::Fixed),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PipelineError::Extract(_)));
    }

    #[tokio::test]
    async fn test_preview_is_capped() {
        let body = "word ".repeat(400).into_bytes();
        let indexed = index_document(
            &FixedEmbedder,
            &CannedStore::default(),
            &upload(FileKind::Txt, body, ChunkStrategy::Fixed),
        )
        .await
        .unwrap();
        assert_eq!(indexed.text_preview.chars().count(), 200);
        assert_eq!(indexed.vector_ids.len(), 3);
    }

    #[tokio::test]
    async fn test_vectors_of_deleted_document_are_discarded() {
        let store = CannedStore::default();
        let document_id = Uuid::new_v4();
        discard_orphaned_vectors(&store, document_id).await;
        assert_eq!(*store.deleted_documents.lock().unwrap(), vec![document_id]);
    }
}
