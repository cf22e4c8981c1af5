pub mod admin;
pub mod auth;
pub mod documents;
pub mod health;
pub mod profile;
pub mod tasks;
pub mod uploads;

use crate::authz::Decision;
use crate::errors::{AppError, AppResult};
use crate::models::profile::Profile;

/// Turns an engine decision into a handler result, logging denials.
pub(crate) fn authorize(operation: &'static str, actor: &Profile, decision: Decision) -> AppResult<()> {
    decision.into_result().map_err(|reason| {
        tracing::warn!(operation, actor_id = %actor.id, reason = reason.code(), "request denied");
        AppError::from(reason)
    })
}
