use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix for environment overrides (`HELIOS__SERVER__PORT=9000`).
pub const ENV_PREFIX: &str = "HELIOS";

/// Custom error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

trait ConfigResultExt<T> {
    fn context(self, context: &'static str) -> Result<T, ConfigError>;
}

impl<T> ConfigResultExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: &'static str) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// This function implements a layered configuration strategy:
/// 1. **Base File**: Loads settings from a file (e.g., `server.toml`). If no path is provided, it defaults to `"server"`.
/// 2. **Environment Overrides**: Overlays values from environment variables prefixed with `HELIOS__`.
///    Nested structures are accessed using double underscores (e.g., `HELIOS__FORECAST__VARIANT` maps to `forecast.variant`).
///
/// # Errors
/// This function will return an error if:
/// * The specified (or default) configuration file cannot be found.
/// * The content of the file does not match the structure of type `T`.
///
/// # Example
/// ```rust
/// use helios_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("server"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helios_domain::config::{ApiConfig, ServingVariant};
    use std::fs;

    #[test]
    fn loads_api_config_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("server.toml");
        fs::write(
            &file,
            r#"
[server]
port = 9100

[forecast]
variant = "legacy"
legacy_model = "models/pcc.json"
"#,
        )
        .unwrap();

        let cfg: ApiConfig = load_config(Some(&file)).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.forecast.variant, ServingVariant::Legacy);
        assert_eq!(cfg.forecast.legacy_model, PathBuf::from("models/pcc.json"));
        assert_eq!(cfg.forecast.seasons.len(), 4);
    }

    #[test]
    fn resolves_extension_from_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("server.toml"), "[server]\nport = 9200\n").unwrap();

        let cfg: ApiConfig = load_config(Some(dir.path().join("server"))).unwrap();
        assert_eq!(cfg.server.port, 9200);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config::<ApiConfig>(Some(dir.path().join("absent"))).unwrap_err();

        assert!(matches!(err, ConfigError::Config { context: Some(_), .. }));
        assert!(err.to_string().contains("Failed to build config"));
    }
}
