//! # Logger
//!
//! Console and rolling-file logging for Helios services, built on `tracing-subscriber`.
//!
//! * Console output is compact and colored; file output is non-blocking, rotated,
//!   capped at [`LoggerBuilder::max_files`] and optionally JSON.
//! * `RUST_LOG` is honoured unless [`LoggerBuilder::env_filter`] sets explicit directives.
//! * Optional `opentelemetry` support attaches a tracing layer that uses the
//!   global `OpenTelemetry` tracer. Configure a tracer provider before calling
//!   [`LoggerBuilder::init`].
//!
//! ## Example
//!
//! ```rust
//! # use helios_logger::{Logger, LevelFilter};
//!
//! let _logger = Logger::builder()
//!     .name("helios")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::LoggerError;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct FileOutput {
    path: PathBuf,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

#[derive(Debug)]
pub struct LoggerConfig {
    console: bool,
    level: LevelFilter,
    env_filter: Option<String>,
    file: Option<FileOutput>,
    #[cfg(feature = "opentelemetry")]
    opentelemetry: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            level: LevelFilter::INFO,
            env_filter: None,
            file: None,
            #[cfg(feature = "opentelemetry")]
            opentelemetry: false,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// A builder for configuring and initializing the global tracing subscriber.
///
/// A name is required before [`LoggerBuilder::init`] becomes available; it prefixes
/// rolling log files (`helios.2026-10-18.log`).
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    config: LoggerConfig,
    name: N,
}

impl LoggerBuilder<NoName> {
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder { name: WithName(name.into()), config: self.config }
    }
}

impl<N: Sealed> LoggerBuilder<N> {
    /// Minimum level when no filter directives apply.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Adds an explicit env filter (e.g., `helios_forecast=debug,tower_http=info`).
    ///
    /// Replaces `RUST_LOG`. Invalid filters cause [`LoggerBuilder::init`] to fail.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Writes logs to rolling files under `path` in addition to any console output.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        let file = self.config.file.take().unwrap_or_else(|| FileOutput {
            path: PathBuf::new(),
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
        });
        self.config.file = Some(FileOutput { path: path.into(), ..file });
        self
    }

    /// Number of rotated files to keep. Requires [`LoggerBuilder::path`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn max_files(mut self, max: usize) -> Self {
        if let Some(file) = &mut self.config.file {
            file.max_files = max;
        }
        self
    }

    /// File rotation strategy. Requires [`LoggerBuilder::path`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        if let Some(file) = &mut self.config.file {
            file.rotation = rotation;
        }
        self
    }

    /// JSON lines in the log files. Requires [`LoggerBuilder::path`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn json(mut self, enabled: bool) -> Self {
        if let Some(file) = &mut self.config.file {
            file.json = enabled;
        }
        self
    }

    /// Enables `OpenTelemetry` tracing via `tracing-opentelemetry`.
    #[cfg(feature = "opentelemetry")]
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn opentelemetry(mut self, enabled: bool) -> Self {
        self.config.opentelemetry = enabled;
        self
    }
}

impl LoggerBuilder<WithName> {
    /// Consumes the builder and installs the global tracing subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's [`WorkerGuard`] and must be kept
    /// alive until shutdown, or buffered lines are lost.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber has already been set,
    /// and [`LoggerError::InvalidConfiguration`] for invalid builder settings.
    pub fn init(self) -> Result<Logger, LoggerError> {
        validate_config(&self.config, &self.name.0)?;

        let env_filter = build_env_filter(&self.config)?;

        let mut layers = Vec::new();

        if self.config.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        #[cfg(feature = "opentelemetry")]
        if self.config.opentelemetry {
            let tracer = opentelemetry::global::tracer(self.name.0.clone());
            layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());
        }

        let guard = if let Some(file) = self.config.file {
            fs::create_dir_all(&file.path).map_err(|source| LoggerError::Io {
                source,
                context: Some(format!("Failed to create {}", file.path.display()).into()),
            })?;

            let appender = RollingFileAppender::builder()
                .rotation(file.rotation)
                .filename_prefix(&self.name.0)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(file.max_files)
                .build(&file.path)?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = layer().with_writer(writer).with_ansi(false);
            layers.push(if file.json { file_layer.json().boxed() } else { file_layer.boxed() });

            Some(guard)
        } else {
            None
        };

        if layers.is_empty() {
            return Err(LoggerError::invalid("No logging layers enabled; enable console or file output"));
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }
}

/// A handle to the initialized logging system.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Returns a new [`LoggerBuilder`] to configure the global tracing subscriber.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: NoName }
    }

    /// Whether a file writer is attached.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn validate_config(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::invalid("Logger name cannot be empty"));
    }

    if let Some(file) = &config.file {
        if file.path.as_os_str().is_empty() {
            return Err(LoggerError::invalid("Log path cannot be empty"));
        }
        if file.max_files == 0 {
            return Err(LoggerError::invalid("max_files must be greater than zero"));
        }
    }

    Ok(())
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    config.env_filter.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |filter| {
            builder
                .parse(filter)
                .map_err(|e| LoggerError::invalid(format!("Invalid env filter '{filter}': {e}")))
        },
    )
}
