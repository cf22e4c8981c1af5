use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::authz::Tier;
use crate::models;
use crate::routes::{admin, auth, documents, health, profile, tasks, uploads};
use crate::storage::StoredObject;

#[derive(OpenApi)]
#[openapi(
	paths(
		health::health,
		auth::register,
		auth::login,
		auth::me,
		auth::logout,
		auth::forgot_password,
		auth::reset_password,
		auth::change_password,
		profile::update_own_profile,
		tasks::list_tasks,
		tasks::create_task,
		tasks::update_task,
		tasks::delete_task,
		documents::list_documents,
		documents::upload_document,
		documents::get_document,
		documents::delete_document,
		uploads::upload_file,
		admin::list_profiles,
		admin::update_profile,
		admin::delete_profile,
		admin::list_user_tasks,
		admin::create_user_task
	),
	components(
		schemas(
			health::HealthResponse,
			models::profile::Profile,
			models::profile::ProfileUpdate,
			models::profile::AuthResponse,
			models::profile::LoginRequest,
			models::profile::RegisterRequest,
			models::profile::ForgotPasswordRequest,
			models::profile::ResetPasswordRequest,
			models::profile::ChangePasswordRequest,
			models::profile::MessageResponse,
			models::task::Task,
			models::task::TaskCreateRequest,
			models::task::TaskUpdateRequest,
			models::task::Priority,
			models::task::Label,
			models::task::TaskStatus,
			models::document::Document,
			models::document::DocumentType,
			models::document::DocumentUploadForm,
			StoredObject,
			Tier
		)
	),
	modifiers(&SecurityAddon),
	tags(
		(name = "Health", description = "Service liveness"),
		(name = "Auth", description = "Registration, sessions and passwords"),
		(name = "Profile", description = "Own profile"),
		(name = "Tasks", description = "Personal to-do items"),
		(name = "Documents", description = "Uploaded documents"),
		(name = "Uploads", description = "Generic file uploads"),
		(name = "Admin", description = "Role-gated user and task management")
	)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		let components = openapi.components.get_or_insert_with(Default::default);
		components.add_security_scheme(
			"bearerAuth",
			SecurityScheme::Http(
				HttpBuilder::new()
					.scheme(HttpAuthScheme::Bearer)
					.bearer_format("JWT")
					.build(),
			),
		);
	}
}

/// OpenAPI document with a `servers` entry pointing at the local port.
pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;
	ensure_servers(&mut doc, port);
	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn ensure_servers(doc: &mut Value, port: u16) {
	if doc.get("servers").is_some() {
		return;
	}
	if let Some(root) = doc.as_object_mut() {
		root.insert(
			"servers".to_string(),
			json!([{ "url": format!("http://localhost:{port}"), "description": "Local server" }]),
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn servers_entry_uses_port() {
		let doc = build_openapi(9090).unwrap();
		let value = serde_json::to_value(&doc).unwrap();
		assert_eq!(value["servers"][0]["url"], "http://localhost:9090");
	}
}
