use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::task::{DbTask, NewTask, Task, TaskUpdateRequest};
use crate::utils::utc_now;

const TASK_COLUMNS: &str =
    "id, owner_id, title, is_completed, priority, label, status, description, attachment_url, created_at, updated_at";

/// Tasks newest first, optionally restricted to one owner.
pub async fn list_tasks(pool: &SqlitePool, owner_id: Option<Uuid>) -> AppResult<Vec<Task>> {
    let rows = match owner_id {
        Some(owner_id) => {
            let sql = format!("SELECT {TASK_COLUMNS} FROM todos WHERE owner_id = ? ORDER BY created_at DESC");
            sqlx::query_as::<_, DbTask>(&sql)
                .bind(owner_id)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {TASK_COLUMNS} FROM todos ORDER BY created_at DESC");
            sqlx::query_as::<_, DbTask>(&sql).fetch_all(pool).await?
        }
    };

    rows.into_iter().map(Task::try_from).collect()
}

pub async fn get_task(pool: &SqlitePool, id: Uuid) -> AppResult<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM todos WHERE id = ?");
    sqlx::query_as::<_, DbTask>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Task::try_from)
        .transpose()
}

pub async fn insert_task(pool: &SqlitePool, owner_id: Uuid, task: &NewTask) -> AppResult<Task> {
    let id = Uuid::new_v4();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO todos (id, owner_id, title, is_completed, priority, label, status, description, attachment_url, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(owner_id)
    .bind(&task.title)
    .bind(task.is_completed)
    .bind(task.priority.as_str())
    .bind(task.label.as_str())
    .bind(task.status.as_str())
    .bind(&task.description)
    .bind(&task.attachment_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_task(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("task missing after insert"))
}

/// Writes only the columns the update names, so concurrent partial updates
/// of different fields do not overwrite each other.
pub async fn update_task(pool: &SqlitePool, id: Uuid, update: TaskUpdateRequest) -> AppResult<Task> {
    let update = update.normalized()?;

    let affected = sqlx::query(
        "UPDATE todos SET \
         title = COALESCE(?, title), \
         is_completed = COALESCE(?, is_completed), \
         priority = COALESCE(?, priority), \
         label = COALESCE(?, label), \
         status = COALESCE(?, status), \
         description = CASE WHEN ? THEN ? ELSE description END, \
         attachment_url = CASE WHEN ? THEN ? ELSE attachment_url END, \
         updated_at = ? \
         WHERE id = ?",
    )
    .bind(&update.title)
    .bind(update.is_completed)
    .bind(update.priority.map(|priority| priority.as_str()))
    .bind(update.label.map(|label| label.as_str()))
    .bind(update.status.map(|status| status.as_str()))
    .bind(update.description.is_some())
    .bind(update.description.clone().flatten())
    .bind(update.attachment_url.is_some())
    .bind(update.attachment_url.clone().flatten())
    .bind(utc_now())
    .bind(id)
    .execute(pool)
    .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("task not found"));
    }

    get_task(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("task not found"))
}

pub async fn delete_task(pool: &SqlitePool, id: Uuid) -> AppResult<()> {
    let affected = sqlx::query("DELETE FROM todos WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("task not found"));
    }
    Ok(())
}
