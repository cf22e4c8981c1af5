use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::identities::Identity;
use crate::errors::{AppError, AppResult};
use crate::models::profile::{normalize_full_name, Profile, ProfileUpdate};
use crate::utils::utc_now;

const PROFILE_COLUMNS: &str = "id, email, full_name, is_admin, is_superadmin, created_at, updated_at";

pub async fn get_profile(pool: &SqlitePool, id: Uuid) -> AppResult<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?");
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

/// All profiles ordered by email, ascending.
pub async fn list_profiles(pool: &SqlitePool) -> AppResult<Vec<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY email ASC");
    let profiles = sqlx::query_as::<_, Profile>(&sql).fetch_all(pool).await?;
    Ok(profiles)
}

/// Returns the profile of `identity`, creating it on first authentication.
///
/// An existing profile is never overwritten. The protected flag is decided
/// here, once, from the configured designation.
pub async fn ensure_profile(
    pool: &SqlitePool,
    identity: &Identity,
    full_name: Option<&str>,
    config: &AppConfig,
) -> AppResult<Profile> {
    if let Some(profile) = get_profile(pool, identity.id).await? {
        return Ok(profile);
    }

    let full_name = match full_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => Some(normalize_full_name(name)?),
        None => None,
    };
    let is_superadmin = config.is_designated_superadmin(&identity.email);
    let now = utc_now();

    sqlx::query(
        "INSERT INTO profiles (id, email, full_name, is_admin, is_superadmin, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(identity.id)
    .bind(&identity.email)
    .bind(&full_name)
    .bind(is_superadmin)
    .bind(is_superadmin)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if is_superadmin {
        tracing::info!(profile_id = %identity.id, "protected superadmin profile created");
    }

    get_profile(pool, identity.id)
        .await?
        .ok_or_else(|| AppError::internal("profile missing after insert"))
}

/// Applies an already-authorized update. `None` fields keep their value.
pub async fn update_profile(pool: &SqlitePool, id: Uuid, update: &ProfileUpdate) -> AppResult<Profile> {
    let affected = sqlx::query(
        "UPDATE profiles SET full_name = COALESCE(?, full_name), is_admin = COALESCE(?, is_admin), updated_at = ? WHERE id = ?",
    )
    .bind(&update.full_name)
    .bind(update.is_admin)
    .bind(utc_now())
    .bind(id)
    .execute(pool)
    .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("profile not found"));
    }

    get_profile(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("profile not found"))
}

/// Deletes a profile together with everything it owns and its identity.
///
/// Runs as one transaction in this order: reset tokens, tasks, documents,
/// profile, identity. Returns the storage paths of the removed documents so
/// the caller can delete the objects once the rows are gone.
pub async fn delete_profile_cascade(pool: &SqlitePool, id: Uuid) -> AppResult<Vec<String>> {
    let mut tx = pool.begin().await?;

    let paths: Vec<String> = sqlx::query_scalar("SELECT file_path FROM documents WHERE owner_id = ?")
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM password_resets WHERE user_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let tasks = sqlx::query("DELETE FROM todos WHERE owner_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM documents WHERE owner_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let profile = sqlx::query("DELETE FROM profiles WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if profile.rows_affected() == 0 {
        return Err(AppError::not_found("profile not found"));
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        profile_id = %id,
        tasks_removed = tasks.rows_affected(),
        documents_removed = paths.len(),
        "profile deleted"
    );

    Ok(paths)
}
