//! Structured logging setup using the tracing crate.
//!
//! Supports pretty, compact, full and JSON output, written to stderr or
//! appended to a file. `RUST_LOG` always takes precedence over the
//! configured level.

use crate::error::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Map a `-v` count to a level
    pub fn from_verbosity(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Filter directive for the level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::InvalidConfig {
                key: "logging.level".to_string(),
                message: format!("unknown log level '{}'", other),
            }),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human output
    Pretty,
    /// Single-line output
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
    /// Default fmt output with every span event
    Full,
}

/// Builder for the global subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: LogLevel,
    format: LogFormat,
    ansi: bool,
    with_spans: bool,
    with_target: bool,
    with_file: bool,
    file: Option<PathBuf>,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Create a builder logging warnings to stderr
    pub fn new() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::default(),
            ansi: true,
            with_spans: false,
            with_target: false,
            with_file: false,
            file: None,
        }
    }

    /// Builder for a `-v` count
    pub fn from_verbosity(verbosity: u8) -> Self {
        Self::new()
            .with_level(LogLevel::from_verbosity(verbosity))
            .with_target(verbosity >= 2)
            .with_file(verbosity >= 3)
            .with_spans(verbosity >= 4)
    }

    /// Set the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the log format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set ANSI colors.
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    /// Include span enter/exit events.
    pub fn with_spans(mut self, enabled: bool) -> Self {
        self.with_spans = enabled;
        self
    }

    /// Include target in logs.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Include file/line information.
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    /// Append logs to a file instead of stderr.
    pub fn with_file_output(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Configured level
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Configured format
    pub fn format(&self) -> LogFormat {
        self.format
    }

    fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }

    fn make_writer(&self) -> Result<BoxMakeWriter> {
        match &self.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Ok(BoxMakeWriter::new(Mutex::new(file)))
            }
            None => Ok(BoxMakeWriter::new(io::stderr)),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.with_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Build and install the global subscriber.
    pub fn init(self) -> Result<()> {
        let env_filter = self.build_filter();
        let writer = self.make_writer()?;
        let ansi = self.ansi && self.file.is_none();
        let registry = tracing_subscriber::registry().with(env_filter);

        let result = match self.format {
            LogFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(writer)
                        .with_ansi(ansi)
                        .with_target(self.with_target)
                        .with_file(self.with_file)
                        .with_line_number(self.with_file)
                        .with_span_events(self.span_events()),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(writer)
                        .with_ansi(ansi)
                        .with_target(self.with_target)
                        .with_file(self.with_file)
                        .with_line_number(self.with_file)
                        .with_span_events(self.span_events()),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(self.with_spans)
                        .with_span_list(self.with_spans)
                        .with_file(self.with_file)
                        .with_line_number(self.with_file)
                        .with_span_events(self.span_events()),
                )
                .try_init(),
            LogFormat::Full => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(ansi)
                        .with_target(self.with_target)
                        .with_file(self.with_file)
                        .with_line_number(self.with_file)
                        .with_span_events(FmtSpan::FULL),
                )
                .try_init(),
        };

        result.map_err(|e| Error::Config(e.to_string()))
    }
}
