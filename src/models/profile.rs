use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::Tier;
use crate::errors::AppError;
use crate::events::{Loggable, Severity};

const MAX_FULL_NAME_LENGTH: usize = 120;

/// Application-level record describing a principal's role and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub is_superadmin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn tier(&self) -> Tier {
        Tier::from_flags(self.is_admin, self.is_superadmin)
    }
}

impl Loggable for Profile {
    fn entity_type() -> &'static str { "profile" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

/// Closed set of profile fields a caller may change. The protected flag is
/// intentionally absent and unknown keys are rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[schema(example = "Ada Lovelace")]
    pub full_name: Option<String>,
    #[schema(example = true)]
    pub is_admin: Option<bool>,
}

impl ProfileUpdate {
    pub fn full_name(name: impl Into<String>) -> Self {
        Self {
            full_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn admin(is_admin: bool) -> Self {
        Self {
            is_admin: Some(is_admin),
            ..Self::default()
        }
    }

    /// True when the update carries privilege fields.
    pub fn touches_role(&self) -> bool {
        self.is_admin.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.is_admin.is_none()
    }

    /// Trims the name and rejects empty or oversized values.
    pub fn normalized(mut self) -> Result<Self, AppError> {
        if self.is_empty() {
            return Err(AppError::bad_request("profile update has no fields"));
        }
        if let Some(name) = self.full_name.take() {
            self.full_name = Some(normalize_full_name(&name)?);
        }
        Ok(self)
    }
}

pub fn normalize_full_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("full_name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(AppError::validation(
            "full_name",
            format!("must be at most {MAX_FULL_NAME_LENGTH} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub full_name: Option<String>,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub profile: Profile,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[schema(example = "N3wS3cureP@ss")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[schema(example = "N3wS3cureP@ss")]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_rejects_protected_flag() {
        let err = serde_json::from_str::<ProfileUpdate>(r#"{"full_name":"Eve","is_superadmin":true}"#);
        assert!(err.is_err());
    }

    #[test]
    fn role_change_is_detected() {
        assert!(ProfileUpdate::admin(true).touches_role());
        assert!(!ProfileUpdate::full_name("Ada").touches_role());
    }

    #[test]
    fn normalized_trims_name() {
        let update = ProfileUpdate::full_name("  Ada  ").normalized().unwrap();
        assert_eq!(update.full_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn normalized_rejects_blank_and_empty_updates() {
        assert!(ProfileUpdate::full_name("   ").normalized().is_err());
        assert!(ProfileUpdate::default().normalized().is_err());
    }
}
