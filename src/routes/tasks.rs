use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::db::{profiles, tasks};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, log_activity_with_context, RequestContext};
use crate::extract::ValidJson;
use crate::jwt::CurrentProfile;
use crate::models::profile::Profile;
use crate::models::task::{NewTask, Task, TaskCreateRequest, TaskListQuery, TaskUpdateRequest};

use super::authorize;

#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    params(("owner_id" = Option<Uuid>, Query, description = "List another user's tasks (admin)")),
    responses(
        (status = 200, description = "Tasks, newest first", body = [Task]),
        (status = 403, description = "Not allowed to view these tasks")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Query(query): Query<TaskListQuery>,
) -> AppResult<Json<Vec<Task>>> {
    let owner_id = query.owner_id.unwrap_or(actor.id);
    if owner_id != actor.id {
        let owner = profiles::get_profile(&state.pool, owner_id).await?;
        authorize(
            "task.list",
            &actor,
            state.policy.can_access_user_tasks(Some(&actor), owner.as_ref()),
        )?;
    }

    let tasks = tasks::list_tasks(&state.pool, Some(owner_id)).await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 422, description = "Invalid task")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    ValidJson(payload): ValidJson<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let new_task = NewTask::try_from(payload)?;
    let task = tasks::insert_task(&state.pool, actor.id, &new_task).await?;
    log_activity(&state.event_bus, "created", Some(actor.id), &task);

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 403, description = "Not allowed to change this task"),
        (status = 404, description = "Task not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<TaskUpdateRequest>,
) -> AppResult<Json<Task>> {
    let existing = authorize_task(&state, &actor, id, "task.update").await?;
    let task = tasks::update_task(&state.pool, id, payload).await?;

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(actor.id),
        &task,
        Some(&existing),
        Some(RequestContext::from_headers(&headers)),
    );
    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "Tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 403, description = "Not allowed to delete this task"),
        (status = 404, description = "Task not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let existing = authorize_task(&state, &actor, id, "task.delete").await?;
    tasks::delete_task(&state.pool, id).await?;
    log_activity(&state.event_bus, "deleted", Some(actor.id), &existing);

    Ok(StatusCode::NO_CONTENT)
}

/// Loads the task and its owner and asks the engine before any mutation.
async fn authorize_task(state: &AppState, actor: &Profile, id: Uuid, operation: &'static str) -> AppResult<Task> {
    let task = tasks::get_task(&state.pool, id).await?;
    let owner = match &task {
        Some(task) => profiles::get_profile(&state.pool, task.owner_id).await?,
        None => None,
    };

    authorize(
        operation,
        actor,
        state.policy.can_mutate_task(Some(actor), task.as_ref(), owner.as_ref()),
    )?;

    // An allow decision implies the task was present.
    task.ok_or_else(|| AppError::not_found("task not found"))
}
