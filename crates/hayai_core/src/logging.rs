//! File logging for the note store.
//!
//! # Responsibility
//! - Start one rotating file logger per process from [`LogSettings`].
//! - Record panics as sanitized single-line events.
//!
//! # Invariants
//! - The first successful init wins; later calls must carry identical settings.
//! - Init never panics.
//! - Log lines carry ids, counts and durations only, never note text.

use crate::config::{LogSettings, StoreConfig};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;

const LOG_FILE_BASENAME: &str = "hayai";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 5;
const PANIC_MESSAGE_MAX_CHARS: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn start(settings: &LogSettings) -> Result<Self, String> {
        std::fs::create_dir_all(&settings.dir).map_err(|err| {
            format!(
                "failed to create log directory `{}`: {err}",
                settings.dir.display()
            )
        })?;

        let spec = settings.level.as_str().to_ascii_lowercase();
        let handle = Logger::try_with_str(spec.as_str())
            .map_err(|err| format!("invalid log level `{spec}`: {err}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(settings.dir.as_path())
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(ROTATE_AT_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(KEPT_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            // [YYYY-MM-DD HH:MM:SS.ffffff TZ] LEVEL [module] file:line: message
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        Ok(Self {
            settings: settings.clone(),
            _handle: handle,
        })
    }

    fn ensure_same(&self, requested: &LogSettings) -> Result<(), String> {
        if self.settings == *requested {
            return Ok(());
        }
        Err(format!(
            "logging already active with level `{}` at `{}`; refusing to switch to level `{}` at `{}`",
            self.settings.level,
            self.settings.dir.display(),
            requested.level,
            requested.dir.display()
        ))
    }
}

/// Starts file logging for this process.
///
/// Repeating the call with equal settings is a no-op; any other settings are
/// rejected with a human-readable error.
pub fn init_logging(settings: &LogSettings) -> Result<(), String> {
    let mut started_now = false;
    let active = ACTIVE_LOGGER.get_or_try_init(|| {
        let logger = ActiveLogger::start(settings)?;
        started_now = true;
        Ok::<_, String>(logger)
    })?;

    if !started_now {
        return active.ensure_same(settings);
    }

    install_panic_hook();
    info!(
        "event=store_logging_start module=logging status=ok version={} build_mode={} platform={} level={} log_dir={} schema_version={}",
        env!("CARGO_PKG_VERSION"),
        if cfg!(debug_assertions) { "debug" } else { "release" },
        std::env::consts::OS,
        settings.level,
        settings.dir.display(),
        crate::db::migrations::latest_version()
    );
    Ok(())
}

/// Starts file logging from a [`StoreConfig`].
///
/// Returns `Ok(false)` and leaves logging off when the config has no
/// `log_dir`.
pub fn init_logging_from_config(config: &StoreConfig) -> Result<bool, String> {
    match config.log_settings()? {
        Some(settings) => init_logging(&settings).map(|()| true),
        None => Ok(false),
    }
}

/// Settings of the active logger, or `None` before init.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE_LOGGER.get().map(|active| active.settings.clone())
}

// Only reached once: ACTIVE_LOGGER initializes at most once per process.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info.location().map_or_else(
            || "unknown".to_string(),
            |loc| format!("{}:{}", loc.file(), loc.line()),
        );
        error!(
            "event=panic_captured module=logging status=error location={location} payload={}",
            panic_summary(panic_info.payload())
        );
        previous(panic_info);
    }));
}

// Payload may contain note text; keep it to one capped line.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    one_line(text, PANIC_MESSAGE_MAX_CHARS)
}

fn one_line(text: &str, max_chars: usize) -> String {
    let mut line: String = text
        .chars()
        .take(max_chars)
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .collect();
    if text.chars().nth(max_chars).is_some() {
        line.push_str("...");
    }
    line
}
