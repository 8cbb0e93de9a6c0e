//! Process-wide diagnostic logging.
//!
//! # Responsibility
//! - Start size-rotated file logging at most once per process.
//! - Capture panics as sanitized log events.
//!
//! # Invariants
//! - Initialization never panics.
//! - Repeating the same configuration is a no-op; a different configuration is
//!   rejected instead of silently reconfiguring.
//! - Log records carry metadata only (versions, step names, counts), never
//!   story content.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "story_migration";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 4;
const PANIC_SUMMARY_MAX_CHARS: usize = 200;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: log::LevelFilter,
    pub log_dir: PathBuf,
}

impl LogConfig {
    /// Parses a level name (`trace|debug|info|warn|error`, case-insensitive)
    /// and an absolute directory.
    pub fn parse(level: &str, log_dir: impl AsRef<Path>) -> Result<Self, LoggingError> {
        let level = match level.trim().to_ascii_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" | "warning" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            other => return Err(LoggingError::UnknownLevel(other.to_string())),
        };

        let log_dir = log_dir.as_ref();
        if log_dir.as_os_str().is_empty() {
            return Err(LoggingError::InvalidDirectory(
                "log directory cannot be empty".to_string(),
            ));
        }
        if !log_dir.is_absolute() {
            return Err(LoggingError::InvalidDirectory(format!(
                "log directory must be absolute, got `{}`",
                log_dir.display()
            )));
        }

        Ok(Self {
            level,
            log_dir: log_dir.to_path_buf(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnknownLevel(String),
    InvalidDirectory(String),
    /// Logging is already running with a different configuration.
    Conflict { active: LogConfig },
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidDirectory(message) => write!(f, "{message}"),
            Self::Conflict { active } => write!(
                f,
                "logging already active at `{}` with level `{}`",
                active.log_dir.display(),
                active.level
            ),
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
        }
    }
}

impl Error for LoggingError {}

struct ActiveLogger {
    config: LogConfig,
    _handle: LoggerHandle,
}

/// Starts file logging with `config`.
///
/// # Errors
/// - `Conflict` when logging is already running with another configuration.
/// - `InvalidDirectory` when the directory cannot be created.
/// - `Backend` when `flexi_logger` fails to start.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| start_logger(config))?;
    if active.config != *config {
        return Err(LoggingError::Conflict {
            active: active.config.clone(),
        });
    }
    Ok(())
}

/// Returns the active configuration, or `None` before [`init_logging`].
pub fn logging_status() -> Option<LogConfig> {
    ACTIVE.get().map(|active| active.config.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(config: &LogConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.log_dir).map_err(|err| {
        LoggingError::InvalidDirectory(format!(
            "cannot create log directory `{}`: {err}",
            config.log_dir.display()
        ))
    })?;

    let handle = Logger::with(config.level)
        .log_to_file(
            FileSpec::default()
                .directory(config.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_start module=logging status=ok version={} data_version={} level={}",
        env!("CARGO_PKG_VERSION"),
        crate::migration::DATA_VERSION,
        config.level
    );

    Ok(ActiveLogger {
        config: config.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic module=logging status=error location={} payload={}",
            location,
            single_line(&payload, PANIC_SUMMARY_MAX_CHARS)
        );
        previous(panic_info);
    }));
}

/// Flattens newlines and caps length so one event stays on one line.
fn single_line(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut capped: String = flat.chars().take(max_chars).collect();
    capped.push_str("...");
    capped
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, single_line, LogConfig, LoggingError};

    #[test]
    fn parse_accepts_known_levels_case_insensitively() {
        let dir = std::env::temp_dir();
        let config = LogConfig::parse(" WARNING ", &dir).unwrap();
        assert_eq!(config.level, log::LevelFilter::Warn);

        let err = LogConfig::parse("verbose", &dir).unwrap_err();
        assert_eq!(err, LoggingError::UnknownLevel("verbose".to_string()));
    }

    #[test]
    fn parse_rejects_relative_directory() {
        let err = LogConfig::parse("info", "logs/dev").unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn single_line_flattens_and_caps() {
        assert_eq!(single_line("a\nb", 10), "a b");
        assert_eq!(single_line("abcdef", 3), "abc...");
    }

    #[test]
    fn init_is_idempotent_and_rejects_reconfiguration() {
        // Outlives the test: the logger stays active for the whole process.
        let dir = std::env::temp_dir().join(format!(
            "story-migration-logging-{}",
            std::process::id()
        ));
        let config = LogConfig::parse("info", &dir).unwrap();

        init_logging(&config).unwrap();
        init_logging(&config).unwrap();

        let other = LogConfig::parse("debug", &dir).unwrap();
        let err = init_logging(&other).unwrap_err();
        assert!(matches!(err, LoggingError::Conflict { .. }));
        assert_eq!(logging_status(), Some(config));
    }
}
