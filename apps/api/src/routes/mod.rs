pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::booking::handlers as booking;
use crate::errors::AppError;
use crate::ingest::handlers as ingest;
use crate::rag::handlers as rag;
use crate::state::AppState;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Room for multipart boundaries and headers on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Resolves a `limit` query parameter for list endpoints.
pub fn page_limit(limit: Option<i64>) -> Result<i64, AppError> {
    match limit {
        None => Ok(DEFAULT_PAGE_LIMIT),
        Some(n) if (1..=MAX_PAGE_LIMIT).contains(&n) => Ok(n),
        Some(_) => Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        ))),
    }
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit =
        DefaultBodyLimit::max(state.config.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES);

    let upload_routes = Router::new()
        .route("/file", post(ingest::handle_upload))
        // Older clients post to the doubled prefix.
        .route("/upload/file", post(ingest::handle_upload))
        .layer(upload_limit)
        .route("/files", get(ingest::handle_list_files))
        .route(
            "/files/:id",
            get(ingest::handle_get_file).delete(ingest::handle_delete_file),
        )
        .route("/sources/:file_name", delete(ingest::handle_delete_source));

    let rag_routes = Router::new()
        .route("/ask", post(rag::handle_ask))
        .route(
            "/session/:session_id",
            get(rag::handle_get_session).delete(rag::handle_clear_session),
        );

    let booking_routes = Router::new()
        .route("/schedule", post(booking::handle_schedule))
        .route("/list", get(booking::handle_list))
        .route(
            "/:id",
            get(booking::handle_get).delete(booking::handle_delete),
        );

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest("/upload", upload_routes)
        .nest("/rag", rag_routes)
        .nest("/booking", booking_routes)
        .with_state(state)
}
