use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::Loggable;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
    Txt,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Docx => "docx",
            DocumentType::Txt => "txt",
        }
    }

    /// Classifies an upload by MIME type first, then by file extension.
    pub fn detect(file_name: &str, content_type: Option<&str>) -> Option<Self> {
        match content_type {
            Some("application/pdf") => return Some(DocumentType::Pdf),
            Some(DOCX_MIME) => return Some(DocumentType::Docx),
            Some("text/plain") => return Some(DocumentType::Txt),
            _ => {}
        }

        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        extension.parse().ok()
    }
}

impl FromStr for DocumentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(DocumentType::Pdf),
            "docx" => Ok(DocumentType::Docx),
            "txt" => Ok(DocumentType::Txt),
            other => Err(AppError::validation("file_type", format!("unsupported file type `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "meeting-notes.txt")]
    pub name: String,
    pub file_url: String,
    pub file_path: String,
    pub content: String,
    pub file_type: DocumentType,
    pub created_at: DateTime<Utc>,
}

impl Loggable for Document {
    fn entity_type() -> &'static str { "document" }
    fn subject_id(&self) -> Uuid { self.id }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbDocument {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub file_url: String,
    pub file_path: String,
    pub content: String,
    pub file_type: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbDocument> for Document {
    type Error = AppError;

    fn try_from(value: DbDocument) -> Result<Self, Self::Error> {
        Ok(Document {
            id: value.id,
            owner_id: value.owner_id,
            name: value.name,
            file_url: value.file_url,
            file_path: value.file_path,
            content: value.content,
            file_type: value.file_type.parse()?,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub file_url: String,
    pub file_path: String,
    pub content: String,
    pub file_type: DocumentType,
}

/// Shape of the multipart form accepted by `POST /documents`, for the API docs.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct DocumentUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Extracted text or HTML for pdf/docx uploads.
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_mime_type() {
        assert_eq!(DocumentType::detect("blob", Some("application/pdf")), Some(DocumentType::Pdf));
        assert_eq!(DocumentType::detect("blob", Some(DOCX_MIME)), Some(DocumentType::Docx));
    }

    #[test]
    fn falls_back_to_extension() {
        assert_eq!(DocumentType::detect("Notes.TXT", Some("application/octet-stream")), Some(DocumentType::Txt));
        assert_eq!(DocumentType::detect("report.docx", None), Some(DocumentType::Docx));
    }

    #[test]
    fn rejects_unsupported_files() {
        assert_eq!(DocumentType::detect("image.png", Some("image/png")), None);
        assert_eq!(DocumentType::detect("README", None), None);
    }
}
