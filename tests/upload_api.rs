//! End-to-end tests for the upload endpoint and the service probes.

mod common;

use axum::http::{
    Method, StatusCode,
    header::{ACCESS_CONTROL_REQUEST_METHOD, ORIGIN},
};
use axum_test::multipart::{MultipartForm, Part};
use common::*;
use notedrop::services::drive_service::LinkTieBreak;
use serde_json::Value;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn greeting_and_liveness_endpoints_respond() {
    let app = spawn_app().await;

    let greeting = app.server.get("/").await;
    greeting.assert_status_ok();
    assert_eq!(greeting.text(), "<h1>Hello Sir</h1>");

    let health = app.server.get("/healthz").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "ok");

    let ready = app.server.get("/readyz").await;
    ready.assert_status_ok();
    let body: Value = ready.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["sqlite"]["ok"], true);
    assert_eq!(body["checks"]["staging"]["ok"], true);
}

#[tokio::test]
async fn browser_preflight_for_upload_is_answered() {
    let app = spawn_app().await;

    let response = app
        .server
        .method(Method::OPTIONS, "/upload")
        .add_header(ORIGIN, "http://localhost:5173")
        .add_header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .await;

    assert!(response.status_code().is_success());
    assert_eq!(response.header("access-control-allow-origin"), "*");
    let allowed = response.header("access-control-allow-methods");
    assert!(allowed.to_str().unwrap().contains("POST"));
}

#[tokio::test]
async fn upload_stores_blob_and_metadata() {
    let app = spawn_app().await;
    mock_token(&app.drive).await;
    mock_upload_created(&app.drive, "remote-1").await;

    // a file staged by another in-flight upload must survive this request
    let bystander = app.staging_dir.join("bystander.bin");
    std::fs::write(&bystander, b"other upload").unwrap();

    let response = app
        .server
        .post("/upload")
        .multipart(pdf_form("Algebra", "XYZ", "notes", "notes.pdf"))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "File uploaded successfully!");
    assert_eq!(body["fileId"], "remote-1");

    let hits = app.records.search_by_text("Algebra").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.file_names.0, vec!["notes.pdf".to_string()]);
    assert_eq!(hits[0].record.college.as_deref(), Some("XYZ"));
    assert_eq!(hits[0].record.category.as_deref(), Some("notes"));

    // this request's staged file is gone, the bystander is not
    assert!(bystander.exists());
    assert_eq!(staged_file_count(&app), 1);
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let app = spawn_app().await;

    let form = MultipartForm::new()
        .add_text("title", "Algebra")
        .add_text("collegename", "XYZ")
        .add_text("fileType", "notes");
    let response = app.server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "no file provided");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn remote_storage_failure_maps_to_bad_gateway() {
    let app = spawn_app().await;
    mock_token(&app.drive).await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&app.drive)
        .await;

    let bystander = app.staging_dir.join("bystander.bin");
    std::fs::write(&bystander, b"other upload").unwrap();

    let response = app
        .server
        .post("/upload")
        .multipart(pdf_form("Algebra", "XYZ", "notes", "notes.pdf"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);

    // nothing recorded, own staged file cleaned up, bystander untouched
    assert!(
        app.records
            .search_by_text("Algebra")
            .await
            .unwrap()
            .is_empty()
    );
    assert!(bystander.exists());
    assert_eq!(staged_file_count(&app), 1);
}

#[tokio::test]
async fn credential_rejection_maps_to_bad_gateway() {
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_grant"))
        .mount(&app.drive)
        .await;

    let response = app
        .server
        .post("/upload")
        .multipart(pdf_form("Algebra", "XYZ", "notes", "notes.pdf"))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(staged_file_count(&app), 0);
}

#[tokio::test]
async fn persist_failure_reports_orphaned_remote_file() {
    let app = spawn_app().await;
    mock_token(&app.drive).await;
    mock_upload_created(&app.drive, "remote-9").await;

    sqlx::query("DROP TABLE records")
        .execute(&*app.pool)
        .await
        .unwrap();

    let response = app
        .server
        .post("/upload")
        .multipart(pdf_form("Algebra", "XYZ", "notes", "notes.pdf"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["orphanedFileId"], "remote-9");
    assert_eq!(staged_file_count(&app), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_transfer() {
    let app = spawn_app_with(LinkTieBreak::First, 512).await;

    let form = MultipartForm::new().add_text("title", "big").add_part(
        "file",
        Part::bytes(vec![0u8; 4096])
            .file_name("big.bin")
            .mime_type("application/octet-stream"),
    );
    let response = app.server.post("/upload").multipart(form).await;

    assert!(response.status_code().is_client_error());
    assert!(app.records.search_by_text("big").await.unwrap().is_empty());
    assert_eq!(staged_file_count(&app), 0);
}
