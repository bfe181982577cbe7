//! patchlog-store - Record Store service for the patchlog changelog feed
//!
//! Serves update records by year and accepts shared-secret protected batch
//! imports. Settings resolve CLI > environment > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use patchlog_common::api::SharedSecret;
use patchlog_common::build_info;
use patchlog_common::config::{
    self, resolve_setting, TomlConfig, BIND_ENV, DATABASE_ENV, DEFAULT_BIND_ADDRESS,
    DEFAULT_LOG_LEVEL, INGEST_SECRET_ENV,
};
use patchlog_store::{build_router, db, AppState};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "patchlog-store", version, about = "Record store for the patchlog changelog feed")]
struct Args {
    /// Listen address, e.g. 127.0.0.1:5740
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Shared secret for the import route (default: generated and stored in the database)
    #[arg(long)]
    ingest_secret: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    /// Config file (default: $PATCHLOG_CONFIG or <config_dir>/patchlog/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => TomlConfig::from_file(path)?,
        None => TomlConfig::load()?,
    };

    let log_level = args
        .log_level
        .clone()
        .or_else(|| file_config.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    // Build identification first, before any database delays
    info!(
        "Starting {}",
        build_info::banner("patchlog-store", env!("CARGO_PKG_VERSION"))
    );

    let db_path = resolve_setting(
        args.database.map(|p| p.display().to_string()),
        DATABASE_ENV,
        file_config.database_path.map(|p| p.display().to_string()),
    )
    .map(PathBuf::from)
    .unwrap_or_else(config::default_database_path);
    info!("Database path: {}", db_path.display());

    let pool = match db::init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let configured_secret =
        resolve_setting(args.ingest_secret, INGEST_SECRET_ENV, file_config.ingest_secret);
    let ingest_secret = match configured_secret {
        Some(secret) => {
            info!("Using configured ingest secret");
            SharedSecret::new(&secret)?
        }
        None => {
            let stored = db::load_ingest_secret(&pool)
                .await
                .context("Failed to load ingest secret from settings table")?;
            if stored.generated {
                // patchlog import needs this value as its ingest_secret
                warn!(
                    "No ingest secret configured; generated one. Read it with: {}",
                    db::ingest_secret_hint(&db_path)
                );
                warn!(
                    "Pass it to the patchlog CLI via {} or ingest_secret in config.toml",
                    INGEST_SECRET_ENV
                );
            } else {
                info!("✓ Loaded ingest secret from settings table");
            }
            SharedSecret::new(&stored.value)?
        }
    };

    let state = AppState::new(pool, ingest_secret);
    let app = build_router(state);

    let bind = resolve_setting(args.bind, BIND_ENV, file_config.bind_address)
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("patchlog-store listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
