use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".showbook";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "showbook.sqlite";
/// Overrides the database location.
const DB_ENV: &str = "SHOWBOOK_DB";
/// `tracing` filter directives, e.g. `showbook=debug`.
const LOG_ENV: &str = "SHOWBOOK_LOG";
const DEFAULT_LOG_FILTER: &str = "showbook=info";

/// Where the database and log file live, and how chatty logging is.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// Resolve settings from the environment, defaulting to a data folder in
    /// the user's home. The log file sits next to the database.
    pub fn from_env() -> Result<Self> {
        let db_path = match env::var_os(DB_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_db_path()?,
        };
        let log_filter = env::var(LOG_ENV)
            .ok()
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Ok(Self::with_db_path(db_path, log_filter))
    }

    pub fn with_db_path(db_path: PathBuf, log_filter: String) -> Self {
        let log_dir = db_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            db_path,
            log_dir,
            log_filter,
        }
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
