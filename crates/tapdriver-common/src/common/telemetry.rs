//! Tracing setup for the server.
//!
//! Environment:
//! - `RUST_LOG`: filter directives. Without it the server's own targets log
//!   at the caller's level and everything else at `warn`.
//! - `TAPDRIVER_LOG`: append logs to this file instead of a standard stream
//! - `TAPDRIVER_LOG_FORMAT`: `text` (default) or `json`
//! - `TAPDRIVER_LOG_STREAM`: `stderr` (default) or `stdout`
//!
//! Command handling runs inside a `command` span carrying `method`,
//! `command` and `session_id`; JSON lines include those fields on every
//! event.

use std::io::IsTerminal;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_FILTER_ENV: &str = "RUST_LOG";
pub const LOG_FILE_ENV: &str = "TAPDRIVER_LOG";
pub const LOG_FORMAT_ENV: &str = "TAPDRIVER_LOG_FORMAT";
pub const LOG_STREAM_ENV: &str = "TAPDRIVER_LOG_STREAM";

/// Targets that follow the requested level when `RUST_LOG` is unset.
const SERVER_TARGETS: &[&str] = &["tapdriver", "tapdriver_common", "tower_http"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    Stdout,
    File(PathBuf),
}

/// Where and how the server logs, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
    pub sink: LogSink,
}

impl LogSettings {
    pub fn from_env(default_level: &str) -> Self {
        Self::from_lookup(default_level, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(default_level: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let choice = |key: &str| lookup(key).map(|value| value.trim().to_lowercase());
        let filter = lookup(LOG_FILTER_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| default_directives(default_level));
        let format = match choice(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let file = lookup(LOG_FILE_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let sink = match (file, choice(LOG_STREAM_ENV).as_deref()) {
            (Some(path), _) => LogSink::File(path),
            (None, Some("stdout")) => LogSink::Stdout,
            (None, _) => LogSink::Stderr,
        };
        Self {
            filter,
            format,
            sink,
        }
    }
}

/// `warn` for dependencies, `level` for the server's own targets.
pub fn default_directives(level: &str) -> String {
    SERVER_TARGETS
        .iter()
        .fold("warn".to_string(), |directives, target| {
            format!("{directives},{target}={level}")
        })
}

/// Keeps the non-blocking file writer flushing until dropped.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

pub fn init_tracing(default_level: &str) -> TelemetryGuard {
    init_with(LogSettings::from_env(default_level), default_level)
}

fn init_with(settings: LogSettings, default_level: &str) -> TelemetryGuard {
    let env_filter = EnvFilter::try_new(&settings.filter)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)));

    let stderr = || {
        (
            BoxMakeWriter::new(std::io::stderr),
            None,
            std::io::stderr().is_terminal(),
        )
    };
    let mut unopened = None;
    let (writer, guard, ansi) = match &settings.sink {
        LogSink::File(path) => match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                (BoxMakeWriter::new(non_blocking), Some(guard), false)
            }
            Err(err) => {
                unopened = Some((path.clone(), err));
                stderr()
            }
        },
        LogSink::Stdout => (
            BoxMakeWriter::new(std::io::stdout),
            None,
            std::io::stdout().is_terminal(),
        ),
        LogSink::Stderr => stderr(),
    };

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match settings.format {
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(writer)
                .finish(),
        ),
        LogFormat::Text => Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_thread_ids(true)
                .with_ansi(ansi)
                .with_writer(writer)
                .finish(),
        ),
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return TelemetryGuard { _guard: None };
    }
    if let Some((path, err)) = unopened {
        tracing::warn!(path = %path.display(), error = %err, "Could not open log file; logging to stderr");
    }
    TelemetryGuard { _guard: guard }
}
