//! patchlog - operator CLI for the patchlog changelog feed
//!
//! Lists and searches update records and imports new batches through the
//! ingestion gate. Logs go to stderr; stdout carries only rendered output.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use patchlog_client::{FeedController, FeedStatus, HttpRecordSink, IngestionGate, QueryService};
use patchlog_common::api::SharedSecret;
use patchlog_common::build_info;
use patchlog_common::config::{
    resolve_setting, TomlConfig, DEFAULT_CLIENT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STORE_URL, INGEST_SECRET_ENV, STORE_URL_ENV,
};
use patchlog_common::UpdateRecord;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "patchlog", version, about = "Browse and import patchlog update records")]
struct Cli {
    /// Record store base URL
    #[arg(long, global = true)]
    store_url: Option<String>,

    /// Reference secret the import credential is checked against
    #[arg(long, global = true)]
    ingest_secret: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file (default: $PATCHLOG_CONFIG or <config_dir>/patchlog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List update records in store order
    List {
        /// Only records released in this year (YYYY)
        #[arg(long)]
        year: Option<String>,

        /// Case-insensitive text to narrow the list by
        #[arg(long, default_value = "")]
        search: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the distinct release years, newest first
    Years,

    /// Import a JSON array of update records
    Import {
        file: PathBuf,

        /// Ingest credential (read from stdin when not given)
        #[arg(long, env = "PATCHLOG_CREDENTIAL", hide_env_values = true)]
        credential: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => TomlConfig::from_file(path)?,
        None => TomlConfig::load()?,
    };

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| file_config.log_level.clone())
        .unwrap_or_else(|| DEFAULT_CLIENT_LOG_LEVEL.to_string());
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    info!("{}", build_info::banner("patchlog", env!("CARGO_PKG_VERSION")));

    let store_url = resolve_setting(cli.store_url, STORE_URL_ENV, file_config.store_url)
        .unwrap_or_else(|| DEFAULT_STORE_URL.to_string());
    let timeout = Duration::from_secs(
        file_config
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
    );
    debug!("Record store: {}", store_url);

    match cli.command {
        Command::List { year, search, json } => {
            let (records, _) = load_feed(&store_url, timeout, year.as_deref(), &search).await?;
            print_records(&records, json)?;
        }
        Command::Years => {
            let (_, years) = load_feed(&store_url, timeout, None, "").await?;
            let mut stdout = io::stdout().lock();
            for year in years {
                writeln!(stdout, "{}", year)?;
            }
        }
        Command::Import { file, credential } => {
            let secret =
                resolve_setting(cli.ingest_secret, INGEST_SECRET_ENV, file_config.ingest_secret)
                    .ok_or_else(|| {
                        anyhow!(
                            "No ingest secret configured \
                             (use --ingest-secret, {} or ingest_secret in config.toml)",
                            INGEST_SECRET_ENV
                        )
                    })?;
            let credential = match credential {
                Some(credential) => credential,
                None => read_credential()?,
            };
            run_import(&store_url, timeout, &secret, &credential, &file).await?;
        }
    }

    Ok(())
}

/// One fetch for `year`, then the search narrowing
///
/// Returns the visible records and the year options of the fetched list.
async fn load_feed(
    store_url: &str,
    timeout: Duration,
    year: Option<&str>,
    search: &str,
) -> Result<(Vec<UpdateRecord>, Vec<String>)> {
    let controller = FeedController::new(QueryService::new(store_url, timeout)?);
    controller.set_search(search).await;
    controller.select_year(year).await;

    match controller.status().await {
        FeedStatus::Failed(reason) => bail!("Could not load updates: {}", reason),
        _ => Ok((
            controller.visible().await.unwrap_or_default(),
            controller.year_options().await,
        )),
    }
}

async fn run_import(
    store_url: &str,
    timeout: Duration,
    secret: &str,
    credential: &str,
    file: &Path,
) -> Result<()> {
    let sink = HttpRecordSink::new(store_url, timeout)?;
    let mut gate = IngestionGate::new(SharedSecret::new(secret)?, sink);

    gate.open();
    gate.authorize(credential)?;

    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let response = gate.ingest_bytes(&bytes).await?;

    println!(
        "Imported {} update record(s) from {}",
        response.inserted,
        file.display()
    );
    Ok(())
}

/// One line from stdin, line terminator removed and nothing else
fn read_credential() -> Result<String> {
    eprint!("Ingest credential: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.strip_suffix('\n').unwrap_or(&line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    Ok(line.to_string())
}

fn print_records(records: &[UpdateRecord], json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();

    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(records)?)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(stdout, "No updates found")?;
        return Ok(());
    }

    for record in records {
        writeln!(stdout, "{}  ({})", record.version_name, record.release_date)?;
        print_list(&mut stdout, "Features", Some(&record.major_features))?;
        print_list(&mut stdout, "Weapons", record.weapon_changes.as_ref())?;
        print_list(&mut stdout, "Maps", record.map_changes.as_ref())?;
        writeln!(stdout)?;
    }
    Ok(())
}

fn print_list(out: &mut impl Write, label: &str, items: Option<&Vec<String>>) -> io::Result<()> {
    match items {
        Some(items) if !items.is_empty() => {
            writeln!(out, "  {}:", label)?;
            for item in items {
                writeln!(out, "    - {}", item)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
