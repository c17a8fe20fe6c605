use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::models::NewBooking;
use crate::models::booking::BookingRow;

pub async fn save_booking(pool: &PgPool, booking: &NewBooking) -> Result<BookingRow, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        INSERT INTO bookings (id, name, email, date, time, session_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&booking.name)
    .bind(&booking.email)
    .bind(&booking.date)
    .bind(&booking.time)
    .bind(&booking.session_id)
    .fetch_one(pool)
    .await
}

/// Newest first, optionally restricted to one session.
pub async fn list_bookings(
    pool: &PgPool,
    session_id: Option<&str>,
    limit: i64,
) -> Result<Vec<BookingRow>, sqlx::Error> {
    match session_id {
        Some(session_id) => {
            sqlx::query_as::<_, BookingRow>(
                "SELECT * FROM bookings WHERE session_id = $1 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(session_id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, BookingRow>(
                "SELECT * FROM bookings ORDER BY created_at DESC LIMIT $1",
            )
            .bind(limit)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn get_booking(pool: &PgPool, id: Uuid) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Returns `false` when no booking had this id.
pub async fn delete_booking(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
