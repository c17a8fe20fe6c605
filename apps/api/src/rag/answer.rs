//! Retrieval-augmented answering over the uploaded documents.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::prompts::render;
use crate::llm_client::{CompletionOptions, LlmClient};
use crate::memory::{format_history, ChatTurn};
use crate::rag::embeddings::Embedder;
use crate::rag::prompts::{ANSWER_PROMPT, NO_CONTEXT, NO_HISTORY};
use crate::rag::vector_store::{SearchHit, VectorStore};

pub const ANSWER_TOP_K: usize = 4;
/// Three exchanges.
pub const ANSWER_HISTORY_TURNS: usize = 6;
const ANSWER_OPTIONS: CompletionOptions = CompletionOptions::new(500, 0.7);
const PREVIEW_CHARS: usize = 200;

/// A document that contributed context to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source: String,
    pub preview: String,
}

#[derive(Debug, Clone)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
}

/// Numbers the non-empty hit texts as `Context 1`, `Context 2`, ...
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.text.trim())
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(i, text)| format!("Context {}:\n{}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_answer_prompt(query: &str, hits: &[SearchHit], history: &[ChatTurn]) -> String {
    let context = build_context(hits);
    let history_text = format_history(history, ANSWER_HISTORY_TURNS);
    render(
        ANSWER_PROMPT,
        &[
            (
                "context",
                if context.is_empty() { NO_CONTEXT } else { context.as_str() },
            ),
            (
                "history",
                if history_text.is_empty() {
                    NO_HISTORY
                } else {
                    history_text.as_str()
                },
            ),
            ("query", query),
        ],
    )
}

/// One entry per source file, in hit order, previewing its best-ranked chunk.
pub fn collect_sources(hits: &[SearchHit]) -> Vec<SourceInfo> {
    let mut sources: Vec<SourceInfo> = Vec::new();
    for hit in hits {
        let Some(source) = hit.source.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        if sources.iter().any(|s| s.source == source) {
            continue;
        }
        sources.push(SourceInfo {
            source: source.to_string(),
            preview: hit.text.trim().chars().take(PREVIEW_CHARS).collect(),
        });
    }
    sources
}

/// Embeds the query, retrieves context and asks the LLM for an answer.
pub async fn answer_question(
    embedder: &dyn Embedder,
    vectors: &dyn VectorStore,
    llm: &LlmClient,
    query: &str,
    history: &[ChatTurn],
) -> Result<RagAnswer, AppError> {
    let query_vector = embedder
        .embed_query(query)
        .await
        .map_err(|e| AppError::Embedding(format!("Query embedding failed: {e}")))?;

    let hits = vectors
        .search(&query_vector, ANSWER_TOP_K, 0.0)
        .await
        .map_err(|e| AppError::VectorStore(format!("Search failed: {e}")))?;
    debug!("Retrieved {} chunks for query", hits.len());

    let prompt = build_answer_prompt(query, &hits, history);
    let answer = llm
        .complete(&prompt, ANSWER_OPTIONS)
        .await
        .map_err(|e| AppError::Llm(format!("Answer generation failed: {e}")))?;

    let sources = collect_sources(&hits);
    info!("Answered query using {} source(s)", sources.len());
    Ok(RagAnswer { answer, sources })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::rag::embeddings::{Embedder, EmbeddingError};
    use crate::rag::vector_store::{ChunkMetadata, SearchHit, VectorStore, VectorStoreError};

    pub fn hit(source: Option<&str>, text: &str) -> SearchHit {
        SearchHit {
            id: Uuid::new_v4().to_string(),
            score: 0.8,
            text: text.to_string(),
            source: source.map(str::to_string),
            meta: serde_json::Map::new(),
        }
    }

    /// Returns a constant vector for every input.
    pub struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn model(&self) -> &str {
            "fixed"
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
        }
    }

    /// Serves canned search hits and records the requested `top_k` and
    /// per-document deletes.
    #[derive(Default)]
    pub struct CannedStore {
        pub hits: Vec<SearchHit>,
        pub requested_top_k: Mutex<Option<usize>>,
        pub deleted_documents: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl VectorStore for CannedStore {
        async fn ensure_collection(&self, _dimensions: usize) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn upsert_chunks(
            &self,
            chunks: &[String],
            _vectors: &[Vec<f32>],
            _metadata: &ChunkMetadata,
        ) -> Result<Vec<String>, VectorStoreError> {
            Ok(chunks.iter().map(|_| Uuid::new_v4().to_string()).collect())
        }

        async fn search(
            &self,
            _vector: &[f32],
            top_k: usize,
            _score_threshold: f32,
        ) -> Result<Vec<SearchHit>, VectorStoreError> {
            *self.requested_top_k.lock().unwrap() = Some(top_k);
            Ok(self.hits.iter().take(top_k).cloned().collect())
        }

        async fn delete_by_source(&self, _source: &str) -> Result<usize, VectorStoreError> {
            Ok(0)
        }

        async fn delete_by_document(&self, document_id: Uuid) -> Result<usize, VectorStoreError> {
            self.deleted_documents.lock().unwrap().push(document_id);
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{hit, CannedStore, FixedEmbedder};
    use super::*;
    use crate::llm_client::testing::{client_for, completion};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_context_skips_empty_hits_and_renumbers() {
        let hits = vec![
            hit(Some("a.pdf"), "Rust experience"),
            hit(Some("b.pdf"), "   "),
            hit(Some("c.pdf"), "Go experience"),
        ];
        assert_eq!(
            build_context(&hits),
            "Context 1:\nRust experience\n\nContext 2:\nGo experience"
        );
    }

    #[test]
    fn test_prompt_fallbacks() {
        let prompt = build_answer_prompt("What skills?", &[], &[]);
        assert!(prompt.contains("CONTEXT:\nNo relevant context found.\n"));
        assert!(prompt.contains("CONVERSATION HISTORY:\nNo previous conversation.\n"));
        assert!(prompt.contains("QUESTION:\nWhat skills?\n"));
    }

    #[test]
    fn test_prompt_uses_last_six_turns() {
        let history: Vec<ChatTurn> = (0..8).map(|i| ChatTurn::user(format!("q{i}"))).collect();
        let prompt = build_answer_prompt("next", &[hit(None, "ctx")], &history);
        assert!(!prompt.contains("user: q1\n"));
        assert!(prompt.contains("user: q2\n"));
        assert!(prompt.contains("user: q7\n"));
        assert!(prompt.contains("Context 1:\nctx"));
    }

    #[test]
    fn test_sources_are_unique_in_first_seen_order() {
        let long = "x".repeat(500);
        let hits = vec![
            hit(Some("b.pdf"), &long),
            hit(None, "orphan"),
            hit(Some("a.docx"), "short"),
            hit(Some("b.pdf"), "second chunk"),
        ];
        let sources = collect_sources(&hits);
        let names: Vec<_> = sources.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.docx"]);
        assert_eq!(sources[0].preview.chars().count(), 200);
        assert_eq!(sources[1].preview, "short");
    }

    #[tokio::test]
    async fn test_answer_question_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Rust and Go"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("Based on Context 1, Rust and Go.")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = CannedStore {
            hits: (0..6)
                .map(|i| hit(Some("resume.pdf"), &format!("chunk {i}: Rust and Go")))
                .collect(),
            ..Default::default()
        };

        let answer = answer_question(
            &FixedEmbedder,
            &store,
            &client_for(&server),
            "What languages?",
            &[],
        )
        .await
        .unwrap();

        assert_eq!(answer.answer, "Based on Context 1, Rust and Go.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(*store.requested_top_k.lock().unwrap(), Some(ANSWER_TOP_K));
    }

    #[tokio::test]
    async fn test_blank_query_is_an_embedding_error() {
        let server = MockServer::start().await;
        let err = answer_question(
            &FixedEmbedder,
            &CannedStore::default(),
            &client_for(&server),
            "   ",
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }
}
