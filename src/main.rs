use anyhow::{Context, Result};
use axum::Router;
use notedrop::{
    config::AppConfig,
    handlers::AppState,
    routes::routes::routes,
    services::{
        drive_service::DriveService, record_service::RecordService,
        search_service::SearchService, staging::StagingArea, upload_service::UploadService,
    },
};
use sqlx::sqlite::SqlitePoolOptions;
use std::{io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = AppConfig::from_env_and_args()?;

    tracing::info!(
        "Starting notedrop on {} (staging: {}, db: {})",
        cfg.addr(),
        cfg.staging_dir,
        cfg.database_url
    );

    // --- Ensure staging directory exists ---
    let staging = StagingArea::new(&cfg.staging_dir);
    staging
        .ensure_dir()
        .await
        .with_context(|| format!("creating staging directory {}", cfg.staging_dir))?;

    // --- Initialize SQLite connection ---
    let db_path = cfg
        .database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    if !db_path.contains(":memory:") {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                tracing::info!("Created missing directory {:?}", parent);
            }
        }
        // Create the database file up front so the bare URL connects cleanly
        match std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(db_path)
        {
            Ok(_) => tracing::debug!("Database file ready at {}", db_path),
            Err(e) => tracing::warn!("Failed to prepare database file {}: {}", db_path, e),
        }
    }

    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&cfg.database_url)
            .await
            .with_context(|| format!("opening database {}", cfg.database_url))?,
    );

    // --- Apply schema ---
    sqlx::migrate!("./migrations").run(&*db).await?;
    if migrate {
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize services ---
    let records = RecordService::new(db.clone());
    let drive = DriveService::new(cfg.drive.clone())?;
    let state = AppState {
        uploads: UploadService::new(drive.clone(), records.clone()),
        search: SearchService::new(drive, records.clone()),
        records,
        staging,
    };

    // --- Build router ---
    let app: Router = routes(cfg.max_upload_bytes).with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
