use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::Loggable;

const MAX_TITLE_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(AppError::validation("priority", format!("unknown priority `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    Feature,
    Bug,
    Documentation,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Feature => "feature",
            Label::Bug => "bug",
            Label::Documentation => "documentation",
        }
    }
}

impl FromStr for Label {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(Label::Feature),
            "bug" => Ok(Label::Bug),
            "documentation" => Ok(Label::Documentation),
            other => Err(AppError::validation("label", format!("unknown label `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Backlog,
    #[default]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    Done,
    Canceled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Canceled => "canceled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TaskStatus::Backlog),
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "canceled" => Ok(TaskStatus::Canceled),
            other => Err(AppError::validation("status", format!("unknown status `{other}`"))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Write release notes")]
    pub title: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub label: Label,
    pub status: TaskStatus,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
    #[schema(format = DateTime, example = "2025-10-01T09:00:00Z")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Task {
    fn entity_type() -> &'static str { "task" }
    fn subject_id(&self) -> Uuid { self.id }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTask {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub priority: String,
    pub label: String,
    pub status: String,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbTask> for Task {
    type Error = AppError;

    fn try_from(value: DbTask) -> Result<Self, Self::Error> {
        Ok(Task {
            id: value.id,
            owner_id: value.owner_id,
            title: value.title,
            is_completed: value.is_completed,
            priority: value.priority.parse()?,
            label: value.label.parse()?,
            status: value.status.parse()?,
            description: value.description,
            attachment_url: value.attachment_url,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskCreateRequest {
    #[schema(example = "Write release notes")]
    pub title: String,
    pub is_completed: Option<bool>,
    pub priority: Option<Priority>,
    pub label: Option<Label>,
    pub status: Option<TaskStatus>,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
}

/// Insert payload with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub is_completed: bool,
    pub priority: Priority,
    pub label: Label,
    pub status: TaskStatus,
    pub description: Option<String>,
    pub attachment_url: Option<String>,
}

impl TryFrom<TaskCreateRequest> for NewTask {
    type Error = AppError;

    fn try_from(value: TaskCreateRequest) -> Result<Self, Self::Error> {
        Ok(NewTask {
            title: normalize_title(&value.title)?,
            is_completed: value.is_completed.unwrap_or(false),
            priority: value.priority.unwrap_or_default(),
            label: value.label.unwrap_or_default(),
            status: value.status.unwrap_or_default(),
            description: value.description,
            attachment_url: value.attachment_url,
        })
    }
}

/// Closed set of task fields a caller may change; ownership is not among them.
///
/// `description` and `attachment_url` tell an absent key (keep) apart from an
/// explicit `null` (clear).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub priority: Option<Priority>,
    pub label: Option<Label>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub attachment_url: Option<Option<String>>,
}

impl TaskUpdateRequest {
    /// Trims the title and rejects empty or oversized values.
    pub fn normalized(mut self) -> Result<Self, AppError> {
        if let Some(title) = self.title.take() {
            self.title = Some(normalize_title(&title)?);
        }
        Ok(self)
    }
}

/// Present keys always deserialize to `Some`, so `null` becomes `Some(None)`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn normalize_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("title", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::validation(
            "title",
            format!("must be at most {MAX_TITLE_LENGTH} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub owner_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(json: &str) -> NewTask {
        let req: TaskCreateRequest = serde_json::from_str(json).unwrap();
        NewTask::try_from(req).unwrap()
    }

    #[test]
    fn create_defaults_status_and_completion() {
        let task = create(r#"{"title":"Ship it"}"#);
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(!task.is_completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.label, Label::Feature);
    }

    #[test]
    fn status_uses_hyphenated_wire_name() {
        let task = create(r#"{"title":"Ship it","status":"in-progress"}"#);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), "in-progress");
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
    }

    #[test]
    fn create_rejects_owner_field() {
        let res = serde_json::from_str::<TaskCreateRequest>(
            r#"{"title":"x","owner_id":"00000000-0000-0000-0000-000000000000"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn blank_title_is_a_validation_error() {
        let req: TaskCreateRequest = serde_json::from_str(r#"{"title":"   "}"#).unwrap();
        match NewTask::try_from(req) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "title"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_tells_null_from_absent() {
        let update: TaskUpdateRequest = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(update.description, Some(None));
        assert_eq!(update.attachment_url, None);

        let update: TaskUpdateRequest = serde_json::from_str(r#"{"attachment_url":"https://x.test/a.png"}"#).unwrap();
        assert_eq!(update.attachment_url, Some(Some("https://x.test/a.png".to_string())));
        assert_eq!(update.description, None);
    }

    #[test]
    fn update_title_is_normalized() {
        let update = TaskUpdateRequest {
            title: Some("  Ship it ".into()),
            ..TaskUpdateRequest::default()
        };
        assert_eq!(update.normalized().unwrap().title.as_deref(), Some("Ship it"));

        let blank = TaskUpdateRequest {
            title: Some(" ".into()),
            ..TaskUpdateRequest::default()
        };
        assert!(blank.normalized().is_err());
    }

    #[test]
    fn unknown_stored_value_fails_conversion() {
        let now = Utc::now();
        let row = DbTask {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "t".into(),
            is_completed: false,
            priority: "urgent".into(),
            label: "bug".into(),
            status: "todo".into(),
            description: None,
            attachment_url: None,
            created_at: now,
            updated_at: now,
        };
        assert!(Task::try_from(row).is_err());
    }
}
