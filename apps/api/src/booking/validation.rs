use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

/// The four fields a booking needs, in the order they are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingField {
    Name,
    Email,
    Date,
    Time,
}

impl BookingField {
    pub const ALL: [BookingField; 4] = [
        BookingField::Name,
        BookingField::Email,
        BookingField::Date,
        BookingField::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingField::Name => "name",
            BookingField::Email => "email",
            BookingField::Date => "date",
            BookingField::Time => "time",
        }
    }

    /// Validates `raw` for this field and returns its normalized form.
    pub fn validate(&self, raw: &str) -> Result<String, String> {
        match self {
            BookingField::Name => validate_name(raw),
            BookingField::Email => validate_email(raw),
            BookingField::Date => validate_date(raw),
            BookingField::Time => validate_time(raw),
        }
    }
}

pub fn validate_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    Ok(name.to_string())
}

pub fn validate_email(raw: &str) -> Result<String, String> {
    let email = raw.trim();
    if EMAIL_RE.is_match(email) {
        Ok(email.to_string())
    } else {
        Err("Email must be a valid email address".to_string())
    }
}

/// Accepts a calendar date as `YYYY-MM-DD`.
pub fn validate_date(raw: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| "Date must be in ISO format YYYY-MM-DD".to_string())
}

/// Accepts `H:M` with hour 0-23 and minute 0-59; returns zero-padded `HH:MM`.
pub fn validate_time(raw: &str) -> Result<String, String> {
    let invalid = || "Time must be in HH:MM format".to_string();
    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(format!("{hour:02}:{minute:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Jane Doe ").unwrap(), "Jane Doe");
        assert!(validate_name("   ").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" jane@example.com ").unwrap(), "jane@example.com");
        assert!(validate_email("first.last+tag@mail.co.uk").is_ok());
        assert!(validate_email("jane@example").is_err());
        assert!(validate_email("jane.example.com").is_err());
        assert!(validate_email("jane doe@example.com").is_err());
        assert!(validate_email("null").is_err());
    }

    #[test]
    fn test_validate_date() {
        assert_eq!(validate_date("2025-12-25").unwrap(), "2025-12-25");
        assert!(validate_date("2025-02-30").is_err());
        assert!(validate_date("25/12/2025").is_err());
        assert!(validate_date("tomorrow").is_err());
        assert_eq!(
            validate_date("2025-02-30").unwrap_err(),
            "Date must be in ISO format YYYY-MM-DD"
        );
    }

    #[test]
    fn test_validate_time_normalizes() {
        assert_eq!(validate_time("14:00").unwrap(), "14:00");
        assert_eq!(validate_time("9:5").unwrap(), "09:05");
        assert_eq!(validate_time("00:00").unwrap(), "00:00");
        assert_eq!(validate_time("23:59").unwrap(), "23:59");
    }

    #[test]
    fn test_validate_time_rejects() {
        for bad in ["24:00", "12:60", "2pm", "12:00:00", "12", ":30", "-1:30"] {
            assert_eq!(
                validate_time(bad).unwrap_err(),
                "Time must be in HH:MM format",
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_field_order_and_names() {
        let names: Vec<_> = BookingField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, vec!["name", "email", "date", "time"]);
    }
}
