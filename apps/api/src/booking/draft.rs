//! Multi-turn booking state.
//!
//! A `BookingDraft` only ever holds values that passed field validation, so a
//! field is "missing" exactly when it is `None`.

use serde::{Deserialize, Serialize};

use crate::booking::models::NewBooking;
use crate::booking::validation::BookingField;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl BookingDraft {
    fn slot(&self, field: BookingField) -> &Option<String> {
        match field {
            BookingField::Name => &self.name,
            BookingField::Email => &self.email,
            BookingField::Date => &self.date,
            BookingField::Time => &self.time,
        }
    }

    fn slot_mut(&mut self, field: BookingField) -> &mut Option<String> {
        match field {
            BookingField::Name => &mut self.name,
            BookingField::Email => &mut self.email,
            BookingField::Date => &mut self.date,
            BookingField::Time => &mut self.time,
        }
    }

    /// Keeps only the values that validate, normalized. Blank strings and
    /// placeholder values such as `"null"` are dropped.
    pub fn sanitized(&self) -> BookingDraft {
        let mut clean = BookingDraft::default();
        for field in BookingField::ALL {
            if let Some(raw) = self.slot(field).as_deref().filter(|r| !is_placeholder(r)) {
                *clean.slot_mut(field) = field.validate(raw).ok();
            }
        }
        clean
    }

    /// Overlays the valid fields of `update` onto this draft.
    pub fn merge(&mut self, update: &BookingDraft) {
        let update = update.sanitized();
        for field in BookingField::ALL {
            if let Some(value) = update.slot(field) {
                *self.slot_mut(field) = Some(value.clone());
            }
        }
    }

    pub fn missing_fields(&self) -> Vec<BookingField> {
        BookingField::ALL
            .into_iter()
            .filter(|f| self.slot(*f).is_none())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == BookingField::ALL.len()
    }

    /// Converts a complete draft into a booking, or returns the missing fields.
    pub fn into_new_booking(self, session_id: &str) -> Result<NewBooking, Vec<BookingField>> {
        match (self.name, self.email, self.date, self.time) {
            (Some(name), Some(email), Some(date), Some(time)) => Ok(NewBooking {
                name,
                email,
                date,
                time,
                session_id: session_id.to_string(),
            }),
            (name, email, date, time) => Err(BookingDraft {
                name,
                email,
                date,
                time,
            }
            .missing_fields()),
        }
    }
}

/// Values models emit in place of "unknown".
fn is_placeholder(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "null" | "none" | "n/a" | "unknown"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str, date: &str, time: &str) -> BookingDraft {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        BookingDraft {
            name: opt(name),
            email: opt(email),
            date: opt(date),
            time: opt(time),
        }
    }

    #[test]
    fn test_sanitized_drops_invalid_values() {
        let raw = draft("Jane", "not-an-email", "2025-12-25", "3pm");
        let clean = raw.sanitized();
        assert_eq!(clean, draft("Jane", "", "2025-12-25", ""));
    }

    #[test]
    fn test_merge_accumulates_across_turns() {
        let mut state = BookingDraft::default();
        state.merge(&draft("Jane Doe", "", "", ""));
        assert_eq!(
            state.missing_fields(),
            vec![BookingField::Email, BookingField::Date, BookingField::Time]
        );

        state.merge(&draft("", "jane@example.com", "2025-12-25", "15:30"));
        assert!(state.missing_fields().is_empty());
        assert_eq!(state.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_merge_never_overwrites_with_invalid_values() {
        let mut state = draft("Jane", "jane@example.com", "", "");
        state.merge(&draft("", "garbage", "", "9:5"));
        assert_eq!(state.email.as_deref(), Some("jane@example.com"));
        assert_eq!(state.time.as_deref(), Some("09:05"));
    }

    #[test]
    fn test_merge_later_valid_value_wins() {
        let mut state = draft("", "", "2025-12-24", "");
        state.merge(&draft("", "", "2025-12-25", ""));
        assert_eq!(state.date.as_deref(), Some("2025-12-25"));
    }

    #[test]
    fn test_into_new_booking() {
        let booking = draft("Jane", "jane@example.com", "2025-12-25", "14:00")
            .into_new_booking("s-1")
            .unwrap();
        assert_eq!(booking.session_id, "s-1");
        assert_eq!(booking.time, "14:00");

        let missing = draft("Jane", "", "2025-12-25", "")
            .into_new_booking("s-1")
            .unwrap_err();
        assert_eq!(missing, vec![BookingField::Email, BookingField::Time]);
    }

    #[test]
    fn test_deserializes_llm_nulls() {
        let parsed: BookingDraft =
            serde_json::from_str(r#"{"name": "Jane", "email": null, "date": "null", "time": "None"}"#)
                .unwrap();
        let clean = parsed.sanitized();
        assert_eq!(clean.name.as_deref(), Some("Jane"));
        assert!(clean.email.is_none());
        assert!(clean.date.is_none());
        assert!(clean.time.is_none());
        assert!(!clean.is_empty());
        assert!(BookingDraft::default().is_empty());
    }
}
