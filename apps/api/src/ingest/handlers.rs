//! Axum route handlers for the Upload API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extractors::{AppPath, AppQuery};
use crate::ingest::chunker::{ChunkError, ChunkStrategy};
use crate::ingest::extract::{FileKind, SUPPORTED_EXTENSIONS};
use crate::ingest::pipeline::{process_document, Upload};
use crate::ingest::repository::{
    delete_document, delete_documents_by_file_name, get_document, insert_document, list_documents,
    NewDocument,
};
use crate::models::document::{DocumentRow, DocumentStatus};
use crate::routes::page_limit;
use crate::state::AppState;
use crate::storage::{content_type_for, DocumentArchive};

const FILE_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub strategy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file_type: String,
    pub filename: String,
    pub document_id: Uuid,
    pub status: DocumentStatus,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /upload/file
///
/// Accepts a `.pdf`, `.txt` or `.docx` resume as multipart field `file`.
/// Indexing runs in the background; poll GET /upload/files/:id for the outcome.
pub async fn handle_upload(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let (raw_name, bytes) = read_file_field(&mut multipart).await?;

    let file_name = clean_file_name(raw_name.as_deref().unwrap_or_default())
        .ok_or_else(|| AppError::Validation("Filename is required".to_string()))?;
    let kind = FileKind::from_file_name(&file_name).map_err(|_| {
        AppError::Validation(format!(
            "Only {} files are supported",
            SUPPORTED_EXTENSIONS.join(", ")
        ))
    })?;
    let strategy = resolve_strategy(query.strategy.as_deref(), state.config.default_chunk_strategy)?;

    if bytes.is_empty() {
        return Err(AppError::Validation("File is empty".to_string()));
    }
    if bytes.len() > state.config.max_upload_bytes() {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} MB upload limit",
            state.config.max_upload_size_mb
        )));
    }

    let document_id = Uuid::new_v4();
    let object_key = state
        .archive
        .as_ref()
        .map(|_| DocumentArchive::object_key(document_id, &file_name));

    insert_document(
        &state.db,
        NewDocument {
            id: document_id,
            file_name: &file_name,
            file_type: kind.extension(),
            strategy: strategy.as_str(),
            object_key: object_key.as_deref(),
        },
    )
    .await?;

    // The row exists before the object, so no archived upload is ever untracked.
    if let (Some(archive), Some(key)) = (&state.archive, &object_key) {
        if let Err(e) = archive
            .put(key, bytes.clone(), content_type_for(kind.extension()))
            .await
        {
            if let Err(cleanup) = delete_document(&state.db, document_id).await {
                warn!("Failed to remove document {document_id} after archive error: {cleanup}");
            }
            return Err(e);
        }
    }

    tokio::spawn(process_document(
        state.clone(),
        Upload {
            document_id,
            file_name: file_name.clone(),
            kind,
            bytes,
            strategy,
        },
    ));
    info!("File '{file_name}' queued for processing with strategy '{strategy}'");

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            message: format!("File '{file_name}' uploaded successfully. Processing in background."),
            file_type: kind.extension().to_string(),
            filename: file_name,
            document_id,
            status: DocumentStatus::Processing,
        }),
    ))
}

/// GET /upload/files
pub async fn handle_list_files(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentRow>>, AppError> {
    let limit = page_limit(query.limit)?;
    Ok(Json(list_documents(&state.db, limit).await?))
}

/// GET /upload/files/:id
pub async fn handle_get_file(
    State(state): State<AppState>,
    AppPath(document_id): AppPath<Uuid>,
) -> Result<Json<DocumentRow>, AppError> {
    let document = get_document(&state.db, document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;
    Ok(Json(document))
}

/// DELETE /upload/files/:id
///
/// Removes the document's metadata row, its vectors and its archived upload.
/// The row goes first so indexing still in flight discards its own vectors.
pub async fn handle_delete_file(
    State(state): State<AppState>,
    AppPath(document_id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let document = get_document(&state.db, document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;
    if !delete_document(&state.db, document_id).await? {
        return Err(AppError::NotFound("Document not found".to_string()));
    }

    let deleted_vectors = state
        .vectors
        .delete_by_document(document_id)
        .await
        .map_err(|e| AppError::VectorStore(format!("Delete failed: {e}")))?;

    remove_archived(&state, document.object_key.into_iter()).await;
    info!("Deleted document {document_id} and {deleted_vectors} vectors");

    Ok(Json(json!({
        "message": format!("Document {document_id} deleted successfully"),
        "deleted_vectors": deleted_vectors
    })))
}

/// DELETE /upload/sources/:file_name
///
/// Removes every upload of a file name, including vectors from earlier uploads.
pub async fn handle_delete_source(
    State(state): State<AppState>,
    AppPath(file_name): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    let object_keys = delete_documents_by_file_name(&state.db, &file_name).await?;
    let deleted_documents = object_keys.len();
    let deleted_vectors = state
        .vectors
        .delete_by_source(&file_name)
        .await
        .map_err(|e| AppError::VectorStore(format!("Delete failed: {e}")))?;

    remove_archived(&state, object_keys.into_iter().flatten()).await;
    info!("Deleted source '{file_name}': {deleted_vectors} vectors, {deleted_documents} documents");

    Ok(Json(json!({
        "deleted_vectors": deleted_vectors,
        "deleted_documents": deleted_documents
    })))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Returns the declared file name and contents of the `file` field.
async fn read_file_field(multipart: &mut Multipart) -> Result<(Option<String>, Bytes), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok((file_name, bytes));
    }
    Err(AppError::Validation(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}

/// Strips any client-side directory components. `None` when nothing remains.
fn clean_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn resolve_strategy(
    requested: Option<&str>,
    default: ChunkStrategy,
) -> Result<ChunkStrategy, AppError> {
    match requested.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|e: ChunkError| AppError::Validation(e.to_string())),
        None => Ok(default),
    }
}

/// Best effort: a leftover archive object is logged, not fatal.
async fn remove_archived(state: &AppState, keys: impl Iterator<Item = String>) {
    let Some(archive) = &state.archive else {
        return;
    };
    for key in keys {
        if let Err(e) = archive.delete(&key).await {
            warn!("Failed to remove archived upload {key}: {e}");
        }
    }
}
