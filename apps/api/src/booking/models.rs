use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::validation::{validate_date, validate_email, validate_name, validate_time};
use crate::errors::AppError;
use crate::models::booking::BookingRow;

pub const DEFAULT_SESSION_ID: &str = "anonymous";

/// Returns the session id to use, falling back to `anonymous` when absent or blank.
pub fn session_or_default(session_id: Option<&str>) -> String {
    session_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string()
}

/// A validated booking ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub name: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub session_id: String,
}

/// Request body for `POST /booking/schedule`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub name: String,
    pub email: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ScheduleRequest {
    /// Validates every field, reporting all failures at once.
    pub fn validate(&self) -> Result<NewBooking, AppError> {
        let name = validate_name(&self.name);
        let email = validate_email(&self.email);
        let date = validate_date(&self.date);
        let time = validate_time(&self.time);

        match (name, email, date, time) {
            (Ok(name), Ok(email), Ok(date), Ok(time)) => Ok(NewBooking {
                name,
                email,
                date,
                time,
                session_id: session_or_default(self.session_id.as_deref()),
            }),
            (name, email, date, time) => {
                let errors: Vec<String> = [name.err(), email.err(), date.err(), time.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                Err(AppError::Validation(errors.join("; ")))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub booking_id: Uuid,
    pub message: String,
    pub booking: BookingRow,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub session_id: Option<String>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, date: &str, time: &str) -> ScheduleRequest {
        ScheduleRequest {
            name: "Jane Doe".to_string(),
            email: email.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            session_id: None,
        }
    }

    #[test]
    fn test_session_or_default() {
        assert_eq!(session_or_default(None), "anonymous");
        assert_eq!(session_or_default(Some("  ")), "anonymous");
        assert_eq!(session_or_default(Some(" s-42 ")), "s-42");
    }

    #[test]
    fn test_valid_request_is_normalized() {
        let booking = request("jane@example.com", "2025-12-25", "9:30")
            .validate()
            .unwrap();
        assert_eq!(booking.time, "09:30");
        assert_eq!(booking.session_id, "anonymous");
    }

    #[test]
    fn test_invalid_request_reports_every_field() {
        let err = request("jane", "12/25/2025", "25:00").validate().unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("email"), "{msg}");
                assert!(msg.contains("YYYY-MM-DD"), "{msg}");
                assert!(msg.contains("HH:MM"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
