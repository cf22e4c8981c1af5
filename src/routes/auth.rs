use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::config::normalize_email;
use crate::db::{identities, profiles};
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::extract::ValidJson;
use crate::jwt::{AuthUser, CurrentProfile};
use crate::models::profile::{
    normalize_full_name, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    Profile, RegisterRequest, ResetPasswordRequest,
};
use crate::utils::{hash_password, verify_password};

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Invalid email or name")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = validate_email(&payload.email)?;
    // Everything is validated before the account row exists.
    let full_name = payload
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(normalize_full_name)
        .transpose()?;
    let password_hash = hash_password(&payload.password)?;

    let identity = identities::insert(&state.pool, &email, &password_hash).await?;
    let profile = profiles::ensure_profile(&state.pool, &identity, full_name.as_deref(), &state.config).await?;
    log_activity(&state.event_bus, "created", Some(profile.id), &profile);

    let token = state.jwt.encode(identity.id)?;
    tracing::info!(user_id = %identity.id, "account registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, profile })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let identity = identities::find_by_email(&state.pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid credentials"))?;

    if !verify_password(&payload.password, &identity.password_hash)? {
        return Err(AppError::unauthorized("invalid credentials"));
    }

    // First authentication of an identity without a profile creates it.
    let profile = profiles::ensure_profile(&state.pool, &identity, None, &state.config).await?;
    let token = state.jwt.encode(identity.id)?;

    Ok(Json(AuthResponse { token, profile }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current profile", body = Profile),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(CurrentProfile(profile): CurrentProfile) -> AppResult<Json<Profile>> {
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Logout acknowledged", body = MessageResponse)),
    security(("bearerAuth" = []))
)]
pub async fn logout(_auth: AuthUser) -> AppResult<Json<MessageResponse>> {
    Ok(Json(MessageResponse::new("Logged out")))
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses((status = 202, description = "Reset link sent if the account exists", body = MessageResponse))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ForgotPasswordRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    // Same answer whether or not the account exists.
    if let Some(identity) = identities::find_by_email(&state.pool, &payload.email).await? {
        let token =
            identities::issue_password_reset(&state.pool, identity.id, state.config.reset_token_ttl_minutes).await?;
        let link = format!("{}/reset-password?token={}", state.config.site_url, token);
        tracing::info!(target: "taskdesk::notifier", email = %identity.email, %link, "password reset link issued");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("If the account exists, a reset link has been sent")),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let password_hash = hash_password(&payload.password)?;
    let user_id = identities::redeem_password_reset(&state.pool, payload.token.trim()).await?;
    identities::set_password(&state.pool, user_id, &password_hash).await?;

    tracing::info!(%user_id, "password reset");
    Ok(Json(MessageResponse::new("Password updated")))
}

#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password is wrong")
    ),
    security(("bearerAuth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let identity = identities::get(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("account no longer exists"))?;

    if !verify_password(&payload.current_password, &identity.password_hash)? {
        return Err(AppError::unauthorized("current password is incorrect"));
    }

    let password_hash = hash_password(&payload.new_password)?;
    identities::set_password(&state.pool, identity.id, &password_hash).await?;

    Ok(Json(MessageResponse::new("Password changed")))
}

fn validate_email(email: &str) -> AppResult<String> {
    let email = normalize_email(email);
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };

    if !valid {
        return Err(AppError::validation("email", "must be a valid email address"));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(validate_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["", "ada", "@example.com", "ada@localhost", "ada@.com"] {
            assert!(validate_email(email).is_err(), "{email} should be rejected");
        }
    }
}
