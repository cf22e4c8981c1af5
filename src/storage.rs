//! Object storage for uploaded files.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;

/// Public location of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoredObject {
    #[schema(example = "http://localhost:8000/files/0b6f7c3e9d1a4f0e8f5d2c1b3a4e5f60.pdf")]
    pub url: String,
    #[schema(example = "0b6f7c3e9d1a4f0e8f5d2c1b3a4e5f60.pdf")]
    pub path: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under a fresh unique name ending in `extension`.
    async fn put(&self, extension: Option<&str>, bytes: &[u8]) -> Result<StoredObject, AppError>;

    async fn remove(&self, path: &str) -> Result<(), AppError>;
}

/// Filesystem-backed store; objects are served by the router under `/files`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.upload_dir.clone(), config.public_base_url.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_name(extension: Option<&str>) -> String {
        let stem = Uuid::new_v4().simple().to_string();
        match extension.filter(|ext| is_plain_extension(ext)) {
            Some(ext) => format!("{stem}.{}", ext.to_ascii_lowercase()),
            None => stem,
        }
    }

    /// Resolves `path` inside the root, refusing anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path);
        let is_plain = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !is_plain {
            return Err(AppError::validation("path", "invalid storage path"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, extension: Option<&str>, bytes: &[u8]) -> Result<StoredObject, AppError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| AppError::storage(format!("failed to prepare upload directory: {err}")))?;

        let path = Self::object_name(extension);
        let target = self.resolve(&path)?;

        tokio::fs::write(&target, bytes)
            .await
            .map_err(|err| AppError::storage(format!("failed to write object: {err}")))?;

        tracing::debug!(path = %path, size = bytes.len(), "object stored");

        Ok(StoredObject {
            url: format!("{}/files/{}", self.public_base_url, path),
            path,
        })
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::storage(format!("failed to remove object: {err}"))),
        }
    }
}

fn is_plain_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Lowercased extension of a client file name, if it is plain alphanumeric.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| is_plain_extension(ext))
        .map(str::to_ascii_lowercase)
}

/// Enforces the configured upload size limit.
pub fn ensure_within_limit(size: usize, max_bytes: usize) -> Result<(), AppError> {
    if size == 0 {
        return Err(AppError::validation("file", "file is empty"));
    }
    if size > max_bytes {
        return Err(AppError::validation(
            "file",
            format!("file size exceeds the {} byte limit", max_bytes),
        ));
    }
    Ok(())
}
