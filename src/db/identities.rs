use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::config::normalize_email;
use crate::errors::{AppError, AppResult};
use crate::utils::{generate_token, token_digest, utc_now};

/// Credential record owned by the identity side of the service.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const IDENTITY_COLUMNS: &str = "id, email, password_hash, provider, created_at, updated_at";

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<Identity>> {
    let sql = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE email = ?");
    let identity = sqlx::query_as::<_, Identity>(&sql)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;
    Ok(identity)
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> AppResult<Option<Identity>> {
    let sql = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE id = ?");
    let identity = sqlx::query_as::<_, Identity>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(identity)
}

pub async fn insert(pool: &SqlitePool, email: &str, password_hash: &str) -> AppResult<Identity> {
    let now = utc_now();
    let identity = Identity {
        id: Uuid::new_v4(),
        email: normalize_email(email),
        password_hash: password_hash.to_string(),
        provider: "local".to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, provider, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(identity.id)
    .bind(&identity.email)
    .bind(&identity.password_hash)
    .bind(&identity.provider)
    .bind(identity.created_at)
    .bind(identity.updated_at)
    .execute(pool)
    .await
    .map_err(|err| super::conflict_on_unique(err, "email already in use"))?;

    Ok(identity)
}

pub async fn set_password(pool: &SqlitePool, id: Uuid, password_hash: &str) -> AppResult<()> {
    let affected = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(utc_now())
        .bind(id)
        .execute(pool)
        .await?;

    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }
    Ok(())
}

/// Issues a single-use reset token and returns it in clear; only its digest is stored.
pub async fn issue_password_reset(pool: &SqlitePool, user_id: Uuid, ttl_minutes: i64) -> AppResult<String> {
    let token = generate_token();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO password_resets (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(token_digest(&token))
    .bind(now + Duration::minutes(ttl_minutes))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(token)
}

#[derive(Debug, FromRow)]
struct ResetRow {
    id: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

/// Marks the token used and returns the identity it was issued for.
pub async fn redeem_password_reset(pool: &SqlitePool, token: &str) -> AppResult<Uuid> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ResetRow>(
        "SELECT id, user_id, expires_at, used_at FROM password_resets WHERE token_hash = ?",
    )
    .bind(token_digest(token))
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::bad_request("invalid or expired reset token"))?;

    let now = utc_now();
    if row.used_at.is_some() || row.expires_at <= now {
        return Err(AppError::bad_request("invalid or expired reset token"));
    }

    sqlx::query("UPDATE password_resets SET used_at = ? WHERE id = ?")
        .bind(now)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row.user_id)
}
