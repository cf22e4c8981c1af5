mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};

use common::{multipart_body, multipart_request, spawn_app, spawn_app_with, BOUNDARY};

#[tokio::test]
async fn text_document_round_trip() -> Result<()> {
    let app = spawn_app().await?;
    let (token, owner_id) = app.register("dana@example.com").await?;

    let body = multipart_body(BOUNDARY, "Meeting Notes.TXT", "text/plain", "agenda: ship v1".as_bytes(), None);
    let (status, document) = app.call(multipart_request("/documents", &token, body)?).await?;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {document}");
    assert_eq!(document["name"], "Meeting Notes.TXT");
    assert_eq!(document["file_type"], "txt");
    assert_eq!(document["content"], "agenda: ship v1");
    assert_eq!(document["owner_id"], owner_id.as_str());

    let path = document["file_path"].as_str().unwrap_or_default().to_string();
    assert!(path.ends_with(".txt"));
    assert_eq!(
        document["file_url"].as_str().unwrap_or_default(),
        format!("{}/files/{}", app.config.public_base_url, path)
    );
    assert!(app.config.upload_dir.join(&path).exists());

    let uri = format!("/documents/{}", document["id"].as_str().unwrap_or_default());
    let (status, fetched) = app.send(Method::GET, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], document["id"]);

    let (status, listed) = app.send(Method::GET, "/documents", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!app.config.upload_dir.join(&path).exists());

    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn binary_documents_keep_client_content() -> Result<()> {
    let app = spawn_app().await?;
    let (token, _) = app.register("dana@example.com").await?;

    let body = multipart_body(BOUNDARY, "report.pdf", "application/pdf", b"%PDF-1.4 fake", Some("<p>Quarterly</p>"));
    let (status, document) = app.call(multipart_request("/documents", &token, body)?).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(document["file_type"], "pdf");
    assert_eq!(document["content"], "<p>Quarterly</p>");

    Ok(())
}

#[tokio::test]
async fn documents_are_private() -> Result<()> {
    let app = spawn_app().await?;
    let (owner_token, _) = app.register("dana@example.com").await?;
    let (other_token, _) = app.register("erin@example.com").await?;

    let body = multipart_body(BOUNDARY, "secret.txt", "text/plain", b"top secret", None);
    let (_, document) = app.call(multipart_request("/documents", &owner_token, body)?).await?;
    let uri = format!("/documents/{}", document["id"].as_str().unwrap_or_default());

    let (status, _) = app.send(Method::GET, &uri, Some(&other_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&other_token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = app.send(Method::GET, "/documents", Some(&other_token), None).await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));

    Ok(())
}

#[tokio::test]
async fn unsupported_and_oversized_uploads_fail_validation() -> Result<()> {
    let app = spawn_app_with(|config| config.max_upload_bytes = 1024).await?;
    let (token, _) = app.register("dana@example.com").await?;

    let body = multipart_body(BOUNDARY, "tool.exe", "application/octet-stream", b"MZ", None);
    let (status, error) = app.call(multipart_request("/documents", &token, body)?).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["field"], "file");

    let big = vec![b'a'; 2048];
    let body = multipart_body(BOUNDARY, "big.txt", "text/plain", &big, None);
    let (status, error) = app.call(multipart_request("/documents", &token, body)?).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["field"], "file");

    let body = multipart_body(BOUNDARY, "big.bin", "application/octet-stream", &big, None);
    let (status, _) = app.call(multipart_request("/uploads", &token, body)?).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let body = multipart_body(BOUNDARY, "empty.txt", "text/plain", b"", None);
    let (status, _) = app.call(multipart_request("/documents", &token, body)?).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // nothing was written
    let stored = std::fs::read_dir(&app.config.upload_dir).map(|dir| dir.count()).unwrap_or(0);
    assert_eq!(stored, 0);

    Ok(())
}

#[tokio::test]
async fn generic_upload_returns_public_url() -> Result<()> {
    let app = spawn_app().await?;
    let (token, _) = app.register("dana@example.com").await?;

    let body = multipart_body(BOUNDARY, "diagram.png", "image/png", b"\x89PNG fake", None);
    let (status, stored) = app.call(multipart_request("/uploads", &token, body)?).await?;
    assert_eq!(status, StatusCode::CREATED);

    let path = stored["path"].as_str().unwrap_or_default();
    assert!(path.ends_with(".png"));
    assert!(stored["url"].as_str().unwrap_or_default().ends_with(&format!("/files/{path}")));

    // served back under /files
    let (status, headers, bytes) = app.get_raw(&format!("/files/{path}")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"\x89PNG fake");
    assert_eq!(headers["x-content-type-options"], "nosniff");

    Ok(())
}

#[tokio::test]
async fn stored_name_follows_detected_type() -> Result<()> {
    let app = spawn_app().await?;
    let (token, _) = app.register("dana@example.com").await?;

    let script = b"<script>alert(document.cookie)</script>";
    let body = multipart_body(BOUNDARY, "notes.html", "text/plain", script, None);
    let (status, document) = app.call(multipart_request("/documents", &token, body)?).await?;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {document}");
    assert_eq!(document["file_type"], "txt");
    assert_eq!(document["name"], "notes.html");

    let path = document["file_path"].as_str().unwrap_or_default().to_string();
    assert!(path.ends_with(".txt"), "stored as {path}");

    let (status, headers, _) = app.get_raw(&format!("/files/{path}")).await?;
    assert_eq!(status, StatusCode::OK);
    let content_type = headers["content-type"].to_str()?;
    assert!(content_type.starts_with("text/plain"), "served as {content_type}");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["content-disposition"], "attachment");

    Ok(())
}

#[tokio::test]
async fn generic_uploads_are_served_as_attachments() -> Result<()> {
    let app = spawn_app().await?;
    let (token, _) = app.register("dana@example.com").await?;

    let body = multipart_body(BOUNDARY, "page.html", "text/html", b"<script>1</script>", None);
    let (status, stored) = app.call(multipart_request("/uploads", &token, body)?).await?;
    assert_eq!(status, StatusCode::CREATED);

    let path = stored["path"].as_str().unwrap_or_default();
    let (status, headers, _) = app.get_raw(&format!("/files/{path}")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-disposition"], "attachment");
    assert_eq!(headers["x-content-type-options"], "nosniff");

    Ok(())
}
