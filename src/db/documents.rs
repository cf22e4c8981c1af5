use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::document::{DbDocument, Document, NewDocument};
use crate::utils::utc_now;

const DOCUMENT_COLUMNS: &str = "id, owner_id, name, file_url, file_path, content, file_type, created_at";

pub async fn list_documents(pool: &SqlitePool, owner_id: Uuid) -> AppResult<Vec<Document>> {
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE owner_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, DbDocument>(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(Document::try_from).collect()
}

pub async fn get_document(pool: &SqlitePool, id: Uuid) -> AppResult<Option<Document>> {
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?");
    sqlx::query_as::<_, DbDocument>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Document::try_from)
        .transpose()
}

pub async fn insert_document(pool: &SqlitePool, owner_id: Uuid, document: &NewDocument) -> AppResult<Document> {
    let id = Uuid::new_v4();

    sqlx::query(
        "INSERT INTO documents (id, owner_id, name, file_url, file_path, content, file_type, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(&document.name)
    .bind(&document.file_url)
    .bind(&document.file_path)
    .bind(&document.content)
    .bind(document.file_type.as_str())
    .bind(utc_now())
    .execute(pool)
    .await?;

    get_document(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("document missing after insert"))
}

pub async fn delete_document(pool: &SqlitePool, id: Uuid) -> AppResult<()> {
    let affected = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("document not found"));
    }
    Ok(())
}
