use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::errors::AppError;

pub mod documents;
pub mod identities;
pub mod profiles;
pub mod tasks;

pub async fn init() -> anyhow::Result<SqlitePool> {
	let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

	let options: SqliteConnectOptions = database_url
		.parse::<SqliteConnectOptions>()
		.context("invalid DATABASE_URL")?
		.create_if_missing(true)
		.foreign_keys(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(10)
		.min_connections(1)
		.acquire_timeout(Duration::from_secs(10))
		.connect_with(options)
		.await
		.context("failed to connect to database")?;

	sqlx::migrate!()
		.run(&pool)
		.await
		.context("failed to run migrations")?;

	Ok(pool)
}

/// Maps a unique-constraint violation to `Conflict`, everything else passes through.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
	match &err {
		sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::conflict(message),
		_ => AppError::Database(err),
	}
}
