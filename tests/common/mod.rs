#![allow(dead_code)]
//! Shared harness for the API tests: a router wired to a temp-dir SQLite
//! database and a wiremock stand-in for the Drive endpoints.

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use notedrop::{
    handlers::AppState,
    routes::routes::routes,
    services::{
        drive_service::{DriveConfig, DriveService, LinkTieBreak},
        record_service::RecordService,
        search_service::SearchService,
        staging::StagingArea,
        upload_service::UploadService,
    },
};
use serde_json::json;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{path::PathBuf, sync::Arc};
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

/// Throwaway RSA key used only to sign test assertions.
pub const TEST_KEY_PEM: &str = include_str!("../fixtures/test_key.pem");

pub struct TestApp {
    pub server: TestServer,
    pub drive: MockServer,
    pub records: RecordService,
    pub pool: Arc<SqlitePool>,
    pub staging_dir: PathBuf,
    _tmp: TempDir,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(LinkTieBreak::First, 25 * 1024 * 1024).await
}

pub async fn spawn_app_with(tie_break: LinkTieBreak, max_upload_bytes: usize) -> TestApp {
    let tmp = TempDir::new().unwrap();
    let staging_dir = tmp.path().join("uploads");
    let db_path = tmp.path().join("notedrop.db");

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    let pool = Arc::new(pool);

    let drive_server = MockServer::start().await;
    let drive = DriveService::new(DriveConfig {
        client_email: "uploader@test-project.iam.gserviceaccount.com".into(),
        private_key: TEST_KEY_PEM.into(),
        folder_id: "test-folder".into(),
        api_base_url: drive_server.uri(),
        upload_base_url: drive_server.uri(),
        token_url: format!("{}/token", drive_server.uri()),
        tie_break,
    })
    .unwrap();

    let records = RecordService::new(pool.clone());
    let staging = StagingArea::new(&staging_dir);
    staging.ensure_dir().await.unwrap();

    let state = AppState {
        uploads: UploadService::new(drive.clone(), records.clone()),
        search: SearchService::new(drive, records.clone()),
        records: records.clone(),
        staging,
    };
    let server = TestServer::new(routes(max_upload_bytes).with_state(state)).unwrap();

    TestApp {
        server,
        drive: drive_server,
        records,
        pool,
        staging_dir,
        _tmp: tmp,
    }
}

/// Token endpoint always hands out `test-token`.
pub async fn mock_token(drive: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(drive)
        .await;
}

/// Upload endpoint accepts any multipart body and assigns `file_id`.
pub async fn mock_upload_created(drive: &MockServer, file_id: &str) {
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": file_id })))
        .mount(drive)
        .await;
}

/// List endpoint answers an exact-name query. `link` of `None` means no
/// remote file carries the name.
pub async fn mock_link(drive: &MockServer, file_name: &str, link: Option<&str>) {
    let files = match link {
        Some(url) => json!([{
            "id": format!("id-{}", file_name),
            "name": file_name,
            "webViewLink": url
        }]),
        None => json!([]),
    };
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", format!("name='{}'", file_name)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": files })))
        .mount(drive)
        .await;
}

/// A small multipart form like the ones the web client sends.
pub fn pdf_form(title: &str, college: &str, category: &str, file_name: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title)
        .add_text("collegename", college)
        .add_text("fileType", category)
        .add_part(
            "file",
            Part::bytes(b"%PDF-1.4 test payload".as_slice())
                .file_name(file_name)
                .mime_type("application/pdf"),
        )
}

/// Number of files currently sitting in the staging directory.
pub fn staged_file_count(app: &TestApp) -> usize {
    std::fs::read_dir(&app.staging_dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}
