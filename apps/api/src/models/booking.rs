use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}
