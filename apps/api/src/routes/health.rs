use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "interview-api"
    }))
}

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "RAG System with Interview Booking",
        "endpoints": {
            "upload": "/upload/file",
            "files": "/upload/files",
            "rag": "/rag/ask",
            "session": "/rag/session/:session_id",
            "booking": "/booking/schedule",
            "bookings": "/booking/list"
        }
    }))
}
