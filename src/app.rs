use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeader;
use tower_http::trace::TraceLayer;

use crate::authz::{PolicyEvaluator, TieredPolicy};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::events::{init_event_bus, start_activity_listener, EventBus};
use crate::jwt::JwtConfig;
use crate::routes::{admin, auth, documents, health, profile, tasks, uploads};
use crate::storage::{LocalObjectStore, ObjectStore};

/// Extra room for multipart framing and text fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub config: Arc<AppConfig>,
    pub policy: Arc<dyn PolicyEvaluator>,
    pub store: Arc<dyn ObjectStore>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        jwt: JwtConfig,
        config: AppConfig,
        store: Arc<dyn ObjectStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
            policy: Arc::new(TieredPolicy::new()),
            store,
            event_bus,
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let config = AppConfig::from_env()?;
    create_app_with(pool, jwt_config, config).await
}

pub async fn create_app_with(pool: SqlitePool, jwt: JwtConfig, config: AppConfig) -> Result<Router, AppError> {
    let store = LocalObjectStore::from_config(&config);
    // Stored objects are user content: never rendered inline or sniffed.
    let files = SetResponseHeader::overriding(
        SetResponseHeader::overriding(
            ServeDir::new(store.root()),
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment"),
    );
    let upload_limit = config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let (event_bus, rx) = init_event_bus();
    tokio::spawn(start_activity_listener(rx, pool.clone()));

    let state = AppState::new(pool, jwt, config, Arc::new(store), event_bus);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/password", put(auth::change_password));

    let task_routes = Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/:id", put(tasks::update_task).delete(tasks::delete_task));

    let document_routes = Router::new()
        .route("/", get(documents::list_documents).post(documents::upload_document))
        .route("/:id", get(documents::get_document).delete(documents::delete_document))
        .layer(DefaultBodyLimit::max(upload_limit));

    let upload_routes = Router::new()
        .route("/", post(uploads::upload_file))
        .layer(DefaultBodyLimit::max(upload_limit));

    let admin_routes = Router::new()
        .route("/profiles", get(admin::list_profiles))
        .route("/profiles/:id", put(admin::update_profile).delete(admin::delete_profile))
        .route("/users/:id/tasks", get(admin::list_user_tasks).post(admin::create_user_task));

    let router = Router::new()
        .route("/api/health", get(health::health))
        .route("/profile", put(profile::update_own_profile))
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .nest("/documents", document_routes)
        .nest("/uploads", upload_routes)
        .nest("/admin", admin_routes)
        .nest_service("/files", files)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
