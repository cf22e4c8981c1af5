//! Admin panel endpoints. Every handler resolves the acting profile and the
//! target before asking the engine; nothing is written on a denial.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::db::{profiles, tasks};
use crate::errors::{AppError, AppResult};
use crate::events::{log_activity, log_activity_with_context, RequestContext};
use crate::extract::ValidJson;
use crate::jwt::CurrentProfile;
use crate::models::profile::{Profile, ProfileUpdate};
use crate::models::task::{NewTask, Task, TaskCreateRequest};

use super::authorize;

#[utoipa::path(
    get,
    path = "/admin/profiles",
    tag = "Admin",
    responses(
        (status = 200, description = "All profiles ordered by email", body = [Profile]),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
) -> AppResult<Json<Vec<Profile>>> {
    authorize("profiles.list", &actor, state.policy.can_list_profiles(Some(&actor)))?;
    let profiles = profiles::list_profiles(&state.pool).await?;
    Ok(Json(profiles))
}

#[utoipa::path(
    put,
    path = "/admin/profiles/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Profile id")),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 403, description = "Not allowed to modify this profile"),
        (status = 404, description = "Profile not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    let update = payload.normalized()?;
    let target = profiles::get_profile(&state.pool, id).await?;
    authorize(
        "profile.modify",
        &actor,
        state.policy.can_modify_profile(Some(&actor), target.as_ref(), &update),
    )?;
    let previous = target.ok_or_else(|| AppError::not_found("profile not found"))?;

    let profile = profiles::update_profile(&state.pool, id, &update).await?;
    if update.touches_role() {
        tracing::info!(
            actor_id = %actor.id,
            profile_id = %id,
            is_admin = profile.is_admin,
            "profile role changed"
        );
    }

    log_activity_with_context(
        &state.event_bus,
        "updated",
        Some(actor.id),
        &profile,
        Some(&previous),
        Some(RequestContext::from_headers(&headers)),
    );
    Ok(Json(profile))
}

#[utoipa::path(
    delete,
    path = "/admin/profiles/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 204, description = "Profile, its tasks and documents deleted"),
        (status = 403, description = "Not allowed to delete this profile"),
        (status = 404, description = "Profile not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_profile(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let target = profiles::get_profile(&state.pool, id).await?;
    authorize(
        "profile.delete",
        &actor,
        state.policy.can_delete_profile(Some(&actor), target.as_ref()),
    )?;
    let target = target.ok_or_else(|| AppError::not_found("profile not found"))?;

    let paths = profiles::delete_profile_cascade(&state.pool, id).await?;

    // Rows are committed; objects that fail to go are left behind and logged.
    for path in paths {
        if let Err(err) = state.store.remove(&path).await {
            tracing::warn!(profile_id = %id, %path, error = %err, "orphaned stored object after profile deletion");
        }
    }

    tracing::info!(actor_id = %actor.id, profile_id = %id, "profile deleted");
    log_activity(&state.event_bus, "deleted", Some(actor.id), &target);

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}/tasks",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Owner profile id")),
    responses(
        (status = 200, description = "The user's tasks, newest first", body = [Task]),
        (status = 403, description = "Not allowed to view these tasks"),
        (status = 404, description = "Profile not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_user_tasks(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Task>>> {
    let owner = profiles::get_profile(&state.pool, id).await?;
    authorize(
        "tasks.access",
        &actor,
        state.policy.can_access_user_tasks(Some(&actor), owner.as_ref()),
    )?;

    let tasks = tasks::list_tasks(&state.pool, Some(id)).await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/tasks",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Owner profile id")),
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created for the user", body = Task),
        (status = 403, description = "Not allowed to add tasks for this user"),
        (status = 404, description = "Profile not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_user_task(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let owner = profiles::get_profile(&state.pool, id).await?;
    authorize(
        "tasks.access",
        &actor,
        state.policy.can_access_user_tasks(Some(&actor), owner.as_ref()),
    )?;

    let new_task = NewTask::try_from(payload)?;
    let task = tasks::insert_task(&state.pool, id, &new_task).await?;
    log_activity(&state.event_bus, "created", Some(actor.id), &task);

    Ok((StatusCode::CREATED, Json(task)))
}
