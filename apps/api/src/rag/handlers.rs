//! Axum route handlers for the RAG API.
//!
//! Each `/rag/ask` turn is either a booking turn or a question about the
//! uploaded documents. A session with an unfinished booking draft stays in
//! the booking flow while the user keeps supplying booking details.

use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::booking::draft::BookingDraft;
use crate::booking::extractor::extract_booking_info;
use crate::booking::models::session_or_default;
use crate::booking::repository::save_booking;
use crate::booking::validation::BookingField;
use crate::errors::AppError;
use crate::extractors::{AppJson, AppPath};
use crate::memory::ChatTurn;
use crate::models::booking::BookingRow;
use crate::rag::answer::{answer_question, SourceInfo};
use crate::rag::intent::detect_booking_intent;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
    pub session_id: String,
    pub booking_detected: bool,
    pub booking_data: Option<BookingRow>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub messages: Vec<ChatTurn>,
    pub pending_booking: Option<BookingDraft>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /rag/ask
pub async fn handle_ask(
    State(state): State<AppState>,
    AppJson(request): AppJson<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("Query cannot be empty".to_string()));
    }
    let session_id = session_or_default(request.session_id.as_deref());

    let history = state.memory.get_messages(&session_id).await?;
    let pending = state.memory.load_draft(&session_id).await?;

    let response = match booking_update(&state, query, &history, pending.as_ref()).await {
        Some(draft) => booking_turn(&state, &session_id, draft).await?,
        None => {
            let rag = answer_question(
                state.embedder.as_ref(),
                state.vectors.as_ref(),
                &state.llm,
                query,
                &history,
            )
            .await?;
            AskResponse {
                answer: rag.answer,
                sources: rag.sources,
                session_id: session_id.clone(),
                booking_detected: false,
                booking_data: None,
            }
        }
    };

    state
        .memory
        .record_exchange(&session_id, query, &response.answer)
        .await?;

    Ok(Json(response))
}

/// GET /rag/session/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let messages = state.memory.get_messages(&session_id).await?;
    let pending_booking = state.memory.load_draft(&session_id).await?;
    Ok(Json(SessionResponse {
        session_id,
        messages,
        pending_booking,
    }))
}

/// DELETE /rag/session/:id
pub async fn handle_clear_session(
    State(state): State<AppState>,
    AppPath(session_id): AppPath<String>,
) -> Result<Json<Value>, AppError> {
    state.memory.clear_session(&session_id).await?;
    Ok(Json(json!({
        "message": format!("Session {session_id} cleared successfully")
    })))
}

// ────────────────────────────────────────────────────────────────────────────
// Booking flow
// ────────────────────────────────────────────────────────────────────────────

/// Decides whether this turn belongs to the booking flow and, if so, returns
/// the draft updated with whatever the message supplied.
async fn booking_update(
    state: &AppState,
    query: &str,
    history: &[ChatTurn],
    pending: Option<&BookingDraft>,
) -> Option<BookingDraft> {
    let today = Utc::now().date_naive();

    if let Some(pending) = pending {
        let extraction = extract_booking_info(&state.llm, query, history, today).await;
        let mut draft = pending.clone();
        draft.merge(&extraction.data);
        // Extraction reads history and re-reports fields the draft already
        // holds. Only new or changed values count as booking input.
        if draft != *pending || detect_booking_intent(&state.llm, query).await.is_booking {
            return Some(draft);
        }
        // Unrelated question mid-booking: answer it, keep the draft.
        return None;
    }

    if !detect_booking_intent(&state.llm, query).await.is_booking {
        return None;
    }
    let extraction = extract_booking_info(&state.llm, query, history, today).await;
    Some(extraction.data)
}

async fn booking_turn(
    state: &AppState,
    session_id: &str,
    draft: BookingDraft,
) -> Result<AskResponse, AppError> {
    let (answer, booking_data) = match draft.clone().into_new_booking(session_id) {
        Ok(new_booking) => {
            // A saved booking never outlives its draft.
            state.memory.clear_draft(session_id).await?;
            let booking = match save_booking(&state.db, &new_booking).await {
                Ok(booking) => booking,
                Err(e) => {
                    if let Err(restore) = state.memory.save_draft(session_id, &draft).await {
                        warn!("Failed to restore booking draft for {session_id}: {restore}");
                    }
                    return Err(e.into());
                }
            };
            info!("Booking {} created from conversation {session_id}", booking.id);
            (confirmation_reply(&booking), Some(booking))
        }
        Err(missing) => {
            state.memory.save_draft(session_id, &draft).await?;
            (missing_fields_reply(&missing), None)
        }
    };

    Ok(AskResponse {
        answer,
        sources: Vec::new(),
        session_id: session_id.to_string(),
        booking_detected: true,
        booking_data,
    })
}

fn confirmation_reply(booking: &BookingRow) -> String {
    format!(
        "Great! I've scheduled your interview for {} on {} at {}. Confirmation will be sent to {}.",
        booking.name, booking.date, booking.time, booking.email
    )
}

fn missing_fields_reply(missing: &[BookingField]) -> String {
    let fields: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
    format!(
        "To schedule your interview, I need: {}. Please provide these details.",
        fields.join(", ")
    )
}
