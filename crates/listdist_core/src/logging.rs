//! Process-wide `log` backend setup.
//!
//! # Responsibility
//! - Route `log` records to rolling files (deployed server) or stderr
//!   (CLI, local runs) through one flexi_logger instance per process.
//! - Record panics as a log event before the default hook runs.
//!
//! # Invariants
//! - The first successful init wins; repeating it with the same level and
//!   target is a no-op, anything else is rejected.
//! - Events are `key=value` metadata. Contact cells, emails and credentials
//!   are never written, including through panic payloads.

use flexi_logger::{Age, Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_BASENAME: &str = "listdist";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 14;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Severity threshold accepted from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let level = match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => return Err(LoggingError::UnsupportedLevel(value.trim().to_string())),
        };
        Ok(level)
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Rolling files under an absolute directory.
    Directory(PathBuf),
    Stderr,
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    /// Directory is blank or relative.
    InvalidDirectory(String),
    CreateDirectory {
        dir: PathBuf,
        source: std::io::Error,
    },
    /// flexi_logger refused to start.
    Backend(String),
    /// Logging already runs with a different level or target.
    AlreadyActive {
        level: LogLevel,
        target: LogTarget,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; use trace, debug, info, warn or error"
            ),
            Self::InvalidDirectory(message) => write!(f, "invalid log directory: {message}"),
            Self::CreateDirectory { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(message) => write!(f, "logger failed to start: {message}"),
            Self::AlreadyActive { level, target } => write!(
                f,
                "logging is already active at level `{}` on `{target}`",
                level.as_str()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            _ => None,
        }
    }
}

struct ActiveLogger {
    level: LogLevel,
    target: LogTarget,
    _handle: LoggerHandle,
}

/// Starts rolling file logging under `log_dir`, which must be absolute.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = level.parse()?;
    let dir = absolute_dir(log_dir)?;
    start(level, LogTarget::Directory(dir))
}

/// Starts stderr logging.
pub fn init_stderr_logging(level: &str) -> Result<(), LoggingError> {
    start(level.parse()?, LogTarget::Stderr)
}

/// Level and target of the running logger, if any.
pub fn logging_status() -> Option<(LogLevel, LogTarget)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.target.clone()))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        LogLevel::Debug.as_str()
    } else {
        LogLevel::Info.as_str()
    }
}

fn start(level: LogLevel, target: LogTarget) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| build_logger(level, &target))?;
    if active.level == level && active.target == target {
        Ok(())
    } else {
        Err(LoggingError::AlreadyActive {
            level: active.level,
            target: active.target.clone(),
        })
    }
}

fn build_logger(level: LogLevel, target: &LogTarget) -> Result<ActiveLogger, LoggingError> {
    let logger = Logger::try_with_str(level.as_str())
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    let logger = match target {
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDirectory {
                dir: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
                .rotate(
                    Criterion::AgeOrSize(Age::Day, ROTATE_AT_BYTES),
                    Naming::Timestamps,
                    Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
    };

    let handle = logger
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;
    install_panic_hook();

    info!(
        "event=logging_ready module=core status=ok level={} target={} version={} os={}",
        level.as_str(),
        target,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        level,
        target: target.clone(),
        _handle: handle,
    })
}

fn absolute_dir(raw: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::InvalidDirectory("path is empty".to_string()));
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::InvalidDirectory(format!(
            "`{trimmed}` is not absolute"
        )));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info.location().map_or_else(
            || "unknown".to_string(),
            |loc| format!("{}:{}", loc.file(), loc.line()),
        );
        let (kind, chars) = describe_payload(panic_info.payload());
        error!(
            "event=panic module=core status=error location={location} payload_kind={kind} payload_chars={chars}"
        );
        previous(panic_info);
    }));
}

/// Payload text can carry uploaded cells, so only its shape is reported.
fn describe_payload(payload: &(dyn std::any::Any + Send)) -> (&'static str, usize) {
    if let Some(message) = payload.downcast_ref::<&str>() {
        ("str", message.chars().count())
    } else if let Some(message) = payload.downcast_ref::<String>() {
        ("string", message.chars().count())
    } else {
        ("opaque", 0)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        absolute_dir, describe_payload, init_logging, init_stderr_logging, logging_status,
        LogLevel, LogTarget, LoggingError,
    };
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("listdist-log-{tag}-{}", std::process::id()))
    }

    #[test]
    fn level_parsing_is_lenient_about_case_and_alias() {
        assert_eq!(" WARNING ".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("Info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert!(matches!(
            "loud".parse::<LogLevel>(),
            Err(LoggingError::UnsupportedLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn log_dir_must_be_absolute_and_non_blank() {
        assert!(matches!(
            absolute_dir("logs/server"),
            Err(LoggingError::InvalidDirectory(_))
        ));
        assert!(matches!(
            absolute_dir("  "),
            Err(LoggingError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn panic_payload_is_described_not_copied() {
        let text: Box<dyn std::any::Any + Send> = Box::new(String::from("Ana,555-0100"));
        assert_eq!(describe_payload(text.as_ref()), ("string", 12));

        let opaque: Box<dyn std::any::Any + Send> = Box::new(42_u8);
        assert_eq!(describe_payload(opaque.as_ref()), ("opaque", 0));
    }

    // The logger is process-global; every init assertion lives here.
    #[test]
    fn first_init_wins_and_conflicting_init_is_rejected() {
        let dir = scratch_dir("active");
        let dir_text = dir.to_str().unwrap().to_string();

        init_logging("info", &dir_text).unwrap();
        init_logging("INFO", &dir_text).unwrap();

        assert!(matches!(
            init_logging("debug", &dir_text),
            Err(LoggingError::AlreadyActive { .. })
        ));
        let other_dir = scratch_dir("other");
        assert!(init_logging("info", other_dir.to_str().unwrap()).is_err());
        assert!(matches!(
            init_stderr_logging("info"),
            Err(LoggingError::AlreadyActive { level: LogLevel::Info, .. })
        ));

        assert_eq!(
            logging_status(),
            Some((LogLevel::Info, LogTarget::Directory(dir)))
        );
    }
}
