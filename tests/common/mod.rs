#![allow(dead_code)]

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for `oneshot`

use taskdesk::config::AppConfig;
use taskdesk::create_app_with;
use taskdesk::jwt::JwtConfig;

pub const SUPERADMIN_EMAIL: &str = "root@example.com";
pub const PASSWORD: &str = "password123";
pub const BOUNDARY: &str = "taskdesk-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub config: AppConfig,
    // keeps the database and upload directory alive for the test
    pub dir: TempDir,
}

pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut AppConfig)) -> Result<TestApp> {
    let dir = tempdir()?;
    let db_path = dir.path().join("test.db");

    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    let mut config = AppConfig {
        superadmin_email: Some(SUPERADMIN_EMAIL.to_string()),
        upload_dir: dir.path().join("uploads"),
        ..AppConfig::default()
    };
    customize(&mut config);

    let router = create_app_with(pool.clone(), JwtConfig::new("test-secret", 1), config.clone()).await?;

    Ok(TestApp { router, pool, config, dir })
}

impl TestApp {
    /// Sends a JSON request and returns the status and parsed body (`Null` when empty).
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.call(request).await
    }

    pub async fn call(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let resp = self.router.clone().oneshot(request).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, value))
    }

    /// Unauthenticated GET returning the headers and raw body.
    pub async fn get_raw(&self, uri: &str) -> Result<(StatusCode, HeaderMap, Vec<u8>)> {
        let request = Request::builder().uri(uri).body(Body::empty())?;
        let resp = self.router.clone().oneshot(request).await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        Ok((status, headers, bytes.to_vec()))
    }

    /// Registers an account and returns its token and profile id.
    pub async fn register(&self, email: &str) -> Result<(String, String)> {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "full_name": email.split('@').next(), "email": email, "password": PASSWORD })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "register {email} failed: {body}");
        let token = body["token"].as_str().unwrap_or_default().to_string();
        let id = body["profile"]["id"].as_str().unwrap_or_default().to_string();
        Ok((token, id))
    }

    /// Superadmin session plus an admin and a regular user created through the API.
    pub async fn seed_tiers(&self) -> Result<Tiers> {
        let (root_token, root_id) = self.register(SUPERADMIN_EMAIL).await?;
        let (admin_token, admin_id) = self.register("alice@example.com").await?;
        let (user_token, user_id) = self.register("carol@example.com").await?;

        let root = Session { token: root_token, id: root_id };
        self.promote(&root, &admin_id).await?;

        Ok(Tiers {
            root,
            admin: Session { token: admin_token, id: admin_id },
            user: Session { token: user_token, id: user_id },
        })
    }

    pub async fn promote(&self, by: &Session, target_id: &str) -> Result<()> {
        let (status, body) = self
            .send(
                Method::PUT,
                &format!("/admin/profiles/{target_id}"),
                Some(&by.token),
                Some(json!({ "is_admin": true })),
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "promotion failed: {body}");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub id: String,
}

pub struct Tiers {
    pub root: Session,
    pub admin: Session,
    pub user: Session,
}

/// Builds a multipart body with a `file` part and an optional `content` part.
pub fn multipart_body(boundary: &str, file_name: &str, content_type: &str, bytes: &[u8], content: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");

    if let Some(content) = content {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Disposition: form-data; name=\"content\"\r\n\r\n");
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, token: &str, body: Vec<u8>) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))?)
}
