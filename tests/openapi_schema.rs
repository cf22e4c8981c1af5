use serde_json::Value;

fn openapi() -> anyhow::Result<Value> {
    // Build the OpenAPI document the same way the server does
    let doc = taskdesk::docs::build_openapi(8000)?;
    Ok(serde_json::to_value(&doc)?)
}

#[test]
fn openapi_lists_every_route() -> anyhow::Result<()> {
    let v = openapi()?;
    let paths = v
        .get("paths")
        .and_then(Value::as_object)
        .expect("paths must exist");

    let expected = [
        "/api/health",
        "/auth/register",
        "/auth/login",
        "/auth/me",
        "/auth/logout",
        "/auth/forgot-password",
        "/auth/reset-password",
        "/auth/password",
        "/profile",
        "/tasks",
        "/tasks/{id}",
        "/documents",
        "/documents/{id}",
        "/uploads",
        "/admin/profiles",
        "/admin/profiles/{id}",
        "/admin/users/{id}/tasks",
    ];
    for path in expected {
        assert!(paths.contains_key(path), "OpenAPI missing path '{}'", path);
    }

    Ok(())
}

#[test]
fn profile_update_schema_has_no_protected_flag() -> anyhow::Result<()> {
    let v = openapi()?;
    let props = v
        .pointer("/components/schemas/ProfileUpdate/properties")
        .and_then(Value::as_object)
        .expect("components.schemas.ProfileUpdate.properties must exist");

    assert!(props.contains_key("full_name"));
    assert!(props.contains_key("is_admin"));
    assert!(!props.contains_key("is_superadmin"));

    Ok(())
}

#[test]
fn task_schema_and_bearer_scheme() -> anyhow::Result<()> {
    let v = openapi()?;
    let props = v
        .pointer("/components/schemas/Task/properties")
        .and_then(Value::as_object)
        .expect("components.schemas.Task.properties must exist");
    for key in ["title", "is_completed", "priority", "label", "status", "owner_id"] {
        assert!(props.contains_key(key), "OpenAPI Task schema missing '{}'", key);
    }

    let scheme = v
        .pointer("/components/securitySchemes/bearerAuth/scheme")
        .and_then(Value::as_str);
    assert_eq!(scheme, Some("bearer"));

    Ok(())
}
