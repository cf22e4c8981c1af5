mod common;

use std::time::Duration;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::spawn_app;

async fn wait_for_event(pool: &sqlx::SqlitePool, name: &str) -> Result<Option<(String, String)>> {
    for _ in 0..50 {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT description, severity FROM activity_log WHERE event_name = ?")
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if row.is_some() {
            return Ok(row);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Ok(None)
}

#[tokio::test]
async fn mutations_are_recorded() -> Result<()> {
    let app = spawn_app().await?;
    let tiers = app.seed_tiers().await?;

    let (status, task) = app
        .send(Method::POST, "/tasks", Some(&tiers.user.token), Some(json!({ "title": "audited" })))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/tasks/{}", task["id"].as_str().unwrap_or_default()),
            Some(&tiers.user.token),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let created = wait_for_event(&app.pool, "task.created").await?;
    assert_eq!(created, Some(("Task created".to_string(), "important".to_string())));

    let deleted = wait_for_event(&app.pool, "task.deleted").await?;
    assert_eq!(deleted.map(|(_, severity)| severity).as_deref(), Some("critical"));

    // the promotion done while seeding is a privileged change
    let promoted = wait_for_event(&app.pool, "profile.updated").await?;
    assert_eq!(promoted.map(|(_, severity)| severity).as_deref(), Some("critical"));

    Ok(())
}

#[tokio::test]
async fn denied_requests_leave_no_trace() -> Result<()> {
    let app = spawn_app().await?;
    let tiers = app.seed_tiers().await?;

    let (status, _) = app
        .send(Method::DELETE, &format!("/admin/profiles/{}", tiers.root.id), Some(&tiers.admin.token), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let deletions: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM activity_log WHERE event_name = 'profile.deleted'")
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(deletions, 0);

    Ok(())
}
