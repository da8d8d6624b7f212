//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Normalize logging configuration (level + optional directory).
//! - Start the `flexi_logger` backend once per process: rotating files when
//!   a directory is configured, stderr otherwise.
//! - Capture panics as sanitized log records.
//!
//! # Invariants
//! - Initialization never panics.
//! - Repeating initialization with the same configuration is a no-op.
//! - Any other configuration after the first successful init is rejected.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "todo_mvc";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Requested logging setup, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error` (case-insensitive, `warning` accepted).
    pub level: String,
    /// Absolute directory for rotating log files; `None` logs to stderr.
    pub log_dir: Option<String>,
}

impl LoggingConfig {
    pub fn stderr(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            log_dir: None,
        }
    }

    pub fn file(level: impl Into<String>, log_dir: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            log_dir: Some(log_dir.into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::stderr(default_log_level())
    }
}

/// Effective configuration of the running logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatus {
    pub level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl Display for LoggingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.log_dir {
            Some(dir) => write!(f, "level={} dir={}", self.level, dir.display()),
            None => write!(f, "level={} dir=<stderr>", self.level),
        }
    }
}

struct ActiveLogger {
    status: LoggingStatus,
    _handle: LoggerHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    EmptyLogDir,
    RelativeLogDir(String),
    CreateDir { path: PathBuf, message: String },
    Backend(String),
    /// A logger with a different configuration is already running.
    Conflict {
        active: LoggingStatus,
        requested: LoggingStatus,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyLogDir => write!(f, "log directory cannot be empty"),
            Self::RelativeLogDir(dir) => {
                write!(f, "log directory must be an absolute path, got `{dir}`")
            }
            Self::CreateDir { path, message } => write!(
                f,
                "failed to create log directory `{}`: {message}",
                path.display()
            ),
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already initialized with {active}; refusing to switch to {requested}"
            ),
        }
    }
}

impl Error for LoggingError {}

/// Starts process logging.
///
/// # Errors
/// - Invalid level or directory in `config`.
/// - Directory creation or backend start failure.
/// - `Conflict` when already initialized with a different configuration.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let requested = normalize_config(config)?;

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(&requested))?;
    if active.status != requested {
        return Err(LoggingError::Conflict {
            active: active.status.clone(),
            requested,
        });
    }
    Ok(())
}

/// Returns the running logger configuration, or `None` before init.
pub fn logging_status() -> Option<LoggingStatus> {
    ACTIVE_LOGGER.get().map(|active| active.status.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(status: &LoggingStatus) -> Result<ActiveLogger, LoggingError> {
    let logger = Logger::try_with_str(status.level)
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    let logger = match &status.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| LoggingError::CreateDir {
                path: dir.clone(),
                message: err.to_string(),
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
        None => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
    };

    let handle = logger
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook_once();
    info!(
        "event=logging_started module=core status=ok {} version={}",
        status,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        status: status.clone(),
        _handle: handle,
    })
}

fn normalize_config(config: &LoggingConfig) -> Result<LoggingStatus, LoggingError> {
    let level = normalize_level(&config.level)?;
    let log_dir = config.log_dir.as_deref().map(normalize_log_dir).transpose()?;
    Ok(LoggingStatus { level, log_dir })
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::EmptyLogDir);
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::RelativeLogDir(trimmed.to_string()));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            single_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

fn single_line(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    let mut truncated: String = flattened.chars().take(max_chars).collect();
    if flattened.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{
        init_logging, logging_status, normalize_config, normalize_level, single_line,
        LoggingConfig, LoggingError,
    };

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level(" WARNING ").unwrap(), "warn");
        assert_eq!(normalize_level("Trace").unwrap(), "trace");
        assert_eq!(
            normalize_level("verbose").unwrap_err(),
            LoggingError::UnsupportedLevel("verbose".to_string())
        );
    }

    #[test]
    fn normalize_config_rejects_relative_and_empty_dirs() {
        let err = normalize_config(&LoggingConfig::file("info", "logs/dev")).unwrap_err();
        assert_eq!(err, LoggingError::RelativeLogDir("logs/dev".to_string()));

        let err = normalize_config(&LoggingConfig::file("info", "  ")).unwrap_err();
        assert_eq!(err, LoggingError::EmptyLogDir);

        let status = normalize_config(&LoggingConfig::stderr("INFO")).unwrap();
        assert_eq!(status.level, "info");
        assert_eq!(status.log_dir, None);
    }

    #[test]
    fn single_line_flattens_and_truncates() {
        let flattened = single_line("line1\nline2\rline3", 8);
        assert!(!flattened.contains('\n'));
        assert!(!flattened.contains('\r'));
        assert_eq!(flattened, "line1 li...");
    }

    #[test]
    fn init_is_idempotent_and_rejects_conflicts() {
        // Kept on disk: the logger outlives this test.
        let dir = tempfile::tempdir().expect("temp dir").keep();
        let dir_str = dir.to_str().expect("utf-8 temp dir").to_string();
        let other = tempfile::tempdir().expect("second temp dir");
        let other_str = other.path().to_str().expect("utf-8 temp dir").to_string();

        init_logging(&LoggingConfig::file("info", dir_str.as_str())).expect("first init");
        init_logging(&LoggingConfig::file("INFO", dir_str.as_str())).expect("same config");

        let err = init_logging(&LoggingConfig::file("debug", dir_str.as_str()))
            .expect_err("level conflict");
        assert!(matches!(err, LoggingError::Conflict { .. }));
        assert!(err.to_string().contains("refusing to switch"));

        let err = init_logging(&LoggingConfig::file("info", other_str))
            .expect_err("directory conflict");
        assert!(matches!(err, LoggingError::Conflict { .. }));

        let status = logging_status().expect("logging active");
        assert_eq!(status.level, "info");
        assert_eq!(status.log_dir, Some(dir));
    }
}
