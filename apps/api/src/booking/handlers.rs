//! Axum route handlers for the Booking API.

use axum::{
    extract::State,
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::booking::models::{ListBookingsQuery, ScheduleRequest, ScheduleResponse};
use crate::booking::repository::{delete_booking, get_booking, list_bookings, save_booking};
use crate::errors::AppError;
use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::models::booking::BookingRow;
use crate::routes::page_limit;
use crate::state::AppState;

/// POST /booking/schedule
///
/// Books an interview directly, bypassing the conversational flow.
pub async fn handle_schedule(
    State(state): State<AppState>,
    AppJson(request): AppJson<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let new_booking = request.validate()?;
    let booking = save_booking(&state.db, &new_booking).await?;
    info!("Booking {} saved for session {}", booking.id, booking.session_id);

    Ok(Json(ScheduleResponse {
        success: true,
        booking_id: booking.id,
        message: format!(
            "Interview scheduled successfully for {} on {} at {}",
            booking.name, booking.date, booking.time
        ),
        booking,
    }))
}

/// GET /booking/list
pub async fn handle_list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListBookingsQuery>,
) -> Result<Json<Vec<BookingRow>>, AppError> {
    let limit = page_limit(query.limit)?;
    let session_id = query
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let bookings = list_bookings(&state.db, session_id, limit).await?;
    Ok(Json(bookings))
}

/// GET /booking/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<Uuid>,
) -> Result<Json<BookingRow>, AppError> {
    let booking = get_booking(&state.db, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
    Ok(Json(booking))
}

/// DELETE /booking/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !delete_booking(&state.db, booking_id).await? {
        return Err(AppError::NotFound("Booking not found".to_string()));
    }
    info!("Booking {booking_id} cancelled");
    Ok(Json(json!({
        "message": format!("Booking {booking_id} cancelled successfully")
    })))
}
