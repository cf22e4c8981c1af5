use std::path::PathBuf;

use crate::errors::AppError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_RESET_TTL_MINUTES: i64 = 60;

/// Runtime settings read from the environment (`.env` is loaded by the binaries).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Email whose profile is created as the protected superadmin.
    pub superadmin_email: Option<String>,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub site_url: String,
    pub reset_token_ttl_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            superadmin_email: None,
            upload_dir: PathBuf::from("./uploads"),
            public_base_url: "http://localhost:8000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            site_url: "http://localhost:3000".to_string(),
            reset_token_ttl_minutes: DEFAULT_RESET_TTL_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let superadmin_email = lookup("SUPERADMIN_EMAIL")
            .map(|email| normalize_email(&email))
            .filter(|email| !email.is_empty());

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| AppError::configuration("MAX_UPLOAD_BYTES must be a valid integer"))?,
            None => defaults.max_upload_bytes,
        };

        let reset_token_ttl_minutes = match lookup("RESET_TOKEN_TTL_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or_else(|| AppError::configuration("RESET_TOKEN_TTL_MINUTES must be a positive integer"))?,
            None => defaults.reset_token_ttl_minutes,
        };

        Ok(Self {
            superadmin_email,
            upload_dir: lookup("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            max_upload_bytes,
            site_url: lookup("SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            reset_token_ttl_minutes,
        })
    }

    /// Whether a newly created profile for `email` receives the protected flag.
    pub fn is_designated_superadmin(&self, email: &str) -> bool {
        self.superadmin_email.as_deref() == Some(normalize_email(email).as_str())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
