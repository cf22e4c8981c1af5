use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::db::profiles;
use crate::errors::AppResult;
use crate::events::log_activity_with_context;
use crate::extract::ValidJson;
use crate::jwt::CurrentProfile;
use crate::models::profile::{Profile, ProfileUpdate};

use super::authorize;

/// Own profile edit; the engine treats it as `actor == target`.
#[utoipa::path(
    put,
    path = "/profile",
    tag = "Profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 403, description = "Role changes on your own profile are not allowed"),
        (status = 422, description = "Unknown or invalid field")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_own_profile(
    State(state): State<AppState>,
    CurrentProfile(actor): CurrentProfile,
    ValidJson(payload): ValidJson<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    let update = payload.normalized()?;
    authorize(
        "profile.modify",
        &actor,
        state.policy.can_modify_profile(Some(&actor), Some(&actor), &update),
    )?;

    let profile = profiles::update_profile(&state.pool, actor.id, &update).await?;
    log_activity_with_context(&state.event_bus, "updated", Some(actor.id), &profile, Some(&actor), None);

    Ok(Json(profile))
}
