//! Configuration loading and setting resolution
//!
//! Every setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error. A config file that exists but does
//! not parse is.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "PATCHLOG_CONFIG";

pub const BIND_ENV: &str = "PATCHLOG_BIND";
pub const DATABASE_ENV: &str = "PATCHLOG_DATABASE";
pub const STORE_URL_ENV: &str = "PATCHLOG_STORE_URL";
pub const INGEST_SECRET_ENV: &str = "PATCHLOG_INGEST_SECRET";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5740";
pub const DEFAULT_STORE_URL: &str = "http://127.0.0.1:5740";
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// The CLI keeps stderr quiet unless something goes wrong
pub const DEFAULT_CLIENT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Contents of `config.toml`
///
/// All keys are optional; the store and the client each read the keys they
/// need and ignore the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Record store listen address, e.g. "127.0.0.1:5740"
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Path to the record store SQLite database
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Base URL the client uses to reach the record store
    #[serde(default)]
    pub store_url: Option<String>,

    /// Shared secret guarding the ingestion path
    #[serde(default)]
    pub ingest_secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Client HTTP timeout in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse a config file at an explicit path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the config file from its default location
    ///
    /// Returns the default (empty) config when no file exists.
    pub fn load() -> Result<Self> {
        match config_file_path() {
            Some(path) if path.exists() => {
                debug!("Loading config file {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Location of `config.toml`
///
/// `$PATCHLOG_CONFIG` if set, otherwise `<config_dir>/patchlog/config.toml`.
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("patchlog").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("patchlog"))
        .unwrap_or_else(|| PathBuf::from("./patchlog_data"))
        .join("patchlog.db")
}

/// Resolve a string setting: CLI, then environment, then config file
///
/// Returns `None` when no source provides a value; callers apply their
/// compiled default.
pub fn resolve_setting(
    cli_arg: Option<String>,
    env_var_name: &str,
    file_value: Option<String>,
) -> Option<String> {
    cli_arg.or_else(|| env_value(env_var_name)).or(file_value)
}

/// Environment variable value, treating an empty value as unset
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
