use anyhow::{Context, Result};
use helios::domain::config::{LogConfig, LogRotation};
use helios_logger::{LevelFilter, Logger, Rotation};

/// Installs the global subscriber described by the `[log]` table.
///
/// # Errors
/// Returns an error for an unknown level, bad filter directives, an unwritable log
/// directory, or when a subscriber is already installed.
pub fn init_logger(name: &str, cfg: &LogConfig) -> Result<Logger> {
    let level: LevelFilter =
        cfg.level.parse().with_context(|| format!("Invalid log level '{}'", cfg.level))?;

    let mut builder = Logger::builder().name(name).level(level).console(cfg.console);

    if let Some(filter) = &cfg.filter {
        builder = builder.env_filter(filter);
    }

    if let Some(path) = &cfg.path {
        builder = builder
            .path(path)
            .rotation(rotation(cfg.rotation))
            .max_files(cfg.max_files)
            .json(cfg.json);
    }

    builder.init().context("Failed to initialize logging")
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}
