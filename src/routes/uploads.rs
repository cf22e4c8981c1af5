use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::jwt::CurrentProfile;
use crate::models::document::DocumentUploadForm;
use crate::storage::{ensure_within_limit, file_extension, StoredObject};

/// File part of a multipart form plus the optional extracted `content` field.
#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub content: Option<String>,
}

/// Reads the `file` and `content` parts; other parts are ignored.
pub(crate) async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> AppResult<UploadedFile> {
    let mut file = None;
    let mut content = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| multipart_error(err, max_bytes))? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|err| multipart_error(err, max_bytes))?;
                file = Some((file_name, content_type, bytes));
            }
            Some("content") => {
                let text = field.text().await.map_err(|err| multipart_error(err, max_bytes))?;
                content = Some(text).filter(|text| !text.trim().is_empty());
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| AppError::validation("file", "a `file` part is required"))?;
    ensure_within_limit(bytes.len(), max_bytes)?;

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
        content,
    })
}

fn multipart_error(err: axum::extract::multipart::MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::validation("file", format!("file size exceeds the {max_bytes} byte limit"));
    }
    AppError::bad_request(err.body_text())
}

#[utoipa::path(
    post,
    path = "/uploads",
    tag = "Uploads",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = StoredObject),
        (status = 422, description = "Missing, empty or oversized file"),
        (status = 502, description = "Storage backend failure")
    ),
    security(("bearerAuth" = []))
)]
pub async fn upload_file(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<StoredObject>)> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;
    let extension = file_extension(&upload.file_name);
    let stored = state.store.put(extension.as_deref(), &upload.bytes).await?;

    tracing::info!(actor_id = %actor.id, path = %stored.path, size = upload.bytes.len(), "file uploaded");
    Ok((StatusCode::CREATED, Json(stored)))
}
