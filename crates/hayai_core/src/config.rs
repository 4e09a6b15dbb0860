//! Store configuration.
//!
//! # Responsibility
//! - Describe where the notes database lives and how logging is set up.
//! - Validate host-provided settings before any file is opened.
//!
//! # Invariants
//! - `db_path` and `log_dir` must be absolute once validated.
//! - Log levels are one of `trace|debug|info|warn|error`; `off` is rejected.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database file name used when the host only provides a directory.
pub const DEFAULT_DB_FILE_NAME: &str = "hayai_notes.sqlite3";

/// Host-provided configuration for the note store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Absolute path to the SQLite database file.
    pub db_path: PathBuf,
    /// Log level name; defaults to [`default_log_level`].
    #[serde(default = "default_log_level_name")]
    pub log_level: String,
    /// Absolute log directory. Logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Config storing the database at `db_path` with logging off.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_level: default_log_level_name(),
            log_dir: None,
        }
    }

    /// Config storing `hayai_notes.sqlite3` inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(DEFAULT_DB_FILE_NAME))
    }

    /// Turns file logging on, writing into `log_dir`.
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Checks paths and level without touching the filesystem.
    pub fn validate(&self) -> Result<(), String> {
        if self.db_path.as_os_str().is_empty() {
            return Err("db_path cannot be empty".to_string());
        }
        if !self.db_path.is_absolute() {
            return Err(format!(
                "db_path must be an absolute path, got `{}`",
                self.db_path.display()
            ));
        }
        self.log_settings().map(|_| ())
    }

    /// Validated logging settings, or `None` when no `log_dir` is set.
    pub fn log_settings(&self) -> Result<Option<LogSettings>, String> {
        let level = parse_log_level(self.log_level.as_str())?;
        let Some(log_dir) = self.log_dir.as_ref() else {
            return Ok(None);
        };
        Ok(Some(LogSettings {
            level,
            dir: absolute_dir(log_dir)?,
        }))
    }
}

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    /// Absolute directory receiving rotated `hayai*.log` files.
    pub dir: PathBuf,
}

/// Level used when the host does not pick one.
///
/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Parses a case-insensitive level name; `warning` is accepted for `warn`.
pub fn parse_log_level(raw: &str) -> Result<LevelFilter, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::Trace),
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" | "warning" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, String> {
    if dir.as_os_str().is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    if !dir.is_absolute() {
        return Err(format!(
            "log_dir must be an absolute path, got `{}`",
            dir.display()
        ));
    }
    Ok(dir.to_path_buf())
}

fn default_log_level_name() -> String {
    default_log_level().as_str().to_ascii_lowercase()
}
