use sqlx::PgPool;
use uuid::Uuid;

use crate::models::document::{DocumentRow, DocumentStatus};

pub struct NewDocument<'a> {
    pub id: Uuid,
    pub file_name: &'a str,
    pub file_type: &'a str,
    pub strategy: &'a str,
    pub object_key: Option<&'a str>,
}

/// Records an upload before background processing starts.
pub async fn insert_document(
    pool: &PgPool,
    doc: NewDocument<'_>,
) -> Result<DocumentRow, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents (id, file_name, file_type, strategy, status, object_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(doc.id)
    .bind(doc.file_name)
    .bind(doc.file_type)
    .bind(doc.strategy)
    .bind(DocumentStatus::Processing.as_str())
    .bind(doc.object_key)
    .fetch_one(pool)
    .await
}

/// Returns `false` when the row no longer exists.
pub async fn mark_ready(
    pool: &PgPool,
    id: Uuid,
    vector_ids: &[String],
    text_preview: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET status = $2, total_chunks = $3, vector_ids = $4, text_preview = $5,
            error = NULL, updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(DocumentStatus::Ready.as_str())
    .bind(vector_ids.len() as i32)
    .bind(vector_ids)
    .bind(text_preview)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_failed(pool: &PgPool, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE documents SET status = $2, error = $3, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(DocumentStatus::Failed.as_str())
        .bind(error)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_documents(pool: &PgPool, limit: i64) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents ORDER BY created_at DESC LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await
}

pub async fn get_document(pool: &PgPool, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_document(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM documents WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes every document row uploaded under `file_name`, returning their archive keys.
pub async fn delete_documents_by_file_name(
    pool: &PgPool,
    file_name: &str,
) -> Result<Vec<Option<String>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM documents WHERE file_name = $1 RETURNING object_key",
    )
    .bind(file_name)
    .fetch_all(pool)
    .await
}
