use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, Utc, format::Item, format::StrftimeItems};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ErrorCode;
use crate::list::Sort;

/// Date format used when none is configured, e.g. `05 March 2024, 14:30`.
pub const DEFAULT_DATE_FORMAT: &str = "%d %B %Y, %H:%M";

/// Environment variable that overrides the ticket database location.
pub const DB_ENV: &str = "WEIGHBRIDGE_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeighbridgeConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Ticket database file. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// `pretty`, `text` or `json`.
    #[serde(default)]
    pub output: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Sort applied when `wb list` is run without `--sort`.
    #[serde(default)]
    pub default_sort: Option<Sort>,
}

/// Path of the user config file, if the platform has a config directory.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("weighbridge/config.toml"))
}

/// Load the user config, falling back to defaults when there is none.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<WeighbridgeConfig> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(WeighbridgeConfig::default()),
    }
}

/// Load config from `path`. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML for this
/// schema, or names an invalid date format.
pub fn load_config_from(path: &Path) -> Result<WeighbridgeConfig> {
    if !path.exists() {
        return Ok(WeighbridgeConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<WeighbridgeConfig>(&content).with_context(|| {
        format!(
            "{}: failed to parse {}",
            ErrorCode::ConfigParseError.code(),
            path.display()
        )
    })?;

    if !is_valid_date_format(&config.display.date_format) {
        bail!(
            "{}: invalid display.date_format {:?} in {}",
            ErrorCode::ConfigParseError.code(),
            config.display.date_format,
            path.display()
        );
    }
    Ok(config)
}

/// Resolve the ticket database path: `WEIGHBRIDGE_DB`, then
/// `[database] path`, then `<data dir>/weighbridge/tickets.sqlite3`.
///
/// # Errors
///
/// Returns an error if nothing is configured and the platform has no data
/// directory.
pub fn resolve_db_path(config: &WeighbridgeConfig) -> Result<PathBuf> {
    pick_db_path(env::var_os(DB_ENV), config, dirs::data_dir())
}

fn pick_db_path(
    env_path: Option<OsString>,
    config: &WeighbridgeConfig,
    data_dir: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = env_path.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = &config.database.path {
        return Ok(path.clone());
    }
    match data_dir {
        Some(dir) => Ok(dir.join("weighbridge/tickets.sqlite3")),
        None => bail!("no data directory on this platform; set {DB_ENV} or [database] path"),
    }
}

/// Render `date` in local time with a strftime-style `format`.
///
/// An invalid format falls back to [`DEFAULT_DATE_FORMAT`].
#[must_use]
pub fn format_date(date: DateTime<Utc>, format: &str) -> String {
    let format = if is_valid_date_format(format) {
        format
    } else {
        DEFAULT_DATE_FORMAT
    };
    date.with_timezone(&Local).format(format).to_string()
}

fn is_valid_date_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}
