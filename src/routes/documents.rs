use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::db::documents;
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::jwt::CurrentProfile;
use crate::models::document::{Document, DocumentType, DocumentUploadForm, NewDocument};
use crate::models::profile::Profile;

use super::uploads::{read_upload, UploadedFile};

#[utoipa::path(
    get,
    path = "/documents",
    tag = "Documents",
    responses((status = 200, description = "Own documents, newest first", body = [Document])),
    security(("bearerAuth" = []))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
) -> AppResult<Json<Vec<Document>>> {
    let documents = documents::list_documents(&state.pool, actor.id).await?;
    Ok(Json(documents))
}

#[utoipa::path(
    post,
    path = "/documents",
    tag = "Documents",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = Document),
        (status = 422, description = "Unsupported type or oversized file"),
        (status = 502, description = "Storage backend failure")
    ),
    security(("bearerAuth" = []))
)]
pub async fn upload_document(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Document>)> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    let file_type = DocumentType::detect(&upload.file_name, upload.content_type.as_deref())
        .ok_or_else(|| AppError::validation("file", "only pdf, docx and txt files are supported"))?;
    let content = extract_content(file_type, &upload);

    // The stored name follows the detected type, never the client's extension.
    let stored = state.store.put(Some(file_type.as_str()), &upload.bytes).await?;
    let new_document = NewDocument {
        name: upload.file_name,
        file_url: stored.url,
        file_path: stored.path,
        content,
        file_type,
    };

    let document = match documents::insert_document(&state.pool, actor.id, &new_document).await {
        Ok(document) => document,
        Err(err) => {
            if let Err(cleanup) = state.store.remove(&new_document.file_path).await {
                tracing::warn!(path = %new_document.file_path, error = %cleanup, "failed to remove object after insert error");
            }
            return Err(err);
        }
    };

    log_activity(&state.event_bus, "created", Some(actor.id), &document);
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = Document),
        (status = 404, description = "Document not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_document(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Document>> {
    let document = owned_document(&state, &actor, id).await?;
    Ok(Json(document))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Document not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_document(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let document = owned_document(&state, &actor, id).await?;
    documents::delete_document(&state.pool, id).await?;

    if let Err(err) = state.store.remove(&document.file_path).await {
        tracing::warn!(document_id = %id, path = %document.file_path, error = %err, "orphaned stored object");
    }

    log_activity(&state.event_bus, "deleted", Some(actor.id), &document);
    Ok(StatusCode::NO_CONTENT)
}

/// Documents are visible to their owner only; others get a 404.
async fn owned_document(state: &AppState, actor: &Profile, id: Uuid) -> AppResult<Document> {
    documents::get_document(&state.pool, id)
        .await?
        .filter(|document| document.owner_id == actor.id)
        .ok_or_else(|| AppError::not_found("document not found"))
}

/// Plain text is decoded here; pdf and docx rely on client-extracted content.
fn extract_content(file_type: DocumentType, upload: &UploadedFile) -> String {
    match file_type {
        DocumentType::Txt => String::from_utf8_lossy(&upload.bytes).into_owned(),
        DocumentType::Pdf | DocumentType::Docx => upload.content.clone().unwrap_or_default(),
    }
}
