use crate::constants::{DEFAULT_TARGET, FALL, SPRING, SUMMER, WINTER};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub forecast: ForecastConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Logging outputs. Console output is always compact; files may be JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Explicit filter directives; replaces `RUST_LOG` when set.
    pub filter: Option<String>,
    pub console: bool,
    /// Directory for rolling log files. No file output when absent.
    pub path: Option<PathBuf>,
    pub json: bool,
    pub max_files: usize,
    pub rotation: LogRotation,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Which prediction contract `POST /predict` speaks.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServingVariant {
    /// Season-aware dispatch over four models (4-decimal results).
    #[default]
    Seasonal,
    /// Single model over ten fixed fields (2-decimal results).
    Legacy,
}

/// Model artifacts and feature schemas for the forecast slice.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub variant: ServingVariant,
    /// Label reported alongside every seasonal prediction.
    pub target: String,
    /// Artifact for the single-model legacy variant.
    pub legacy_model: PathBuf,
    /// Per-season artifacts, keyed by lowercase season name.
    pub seasons: BTreeMap<String, SeasonConfig>,
}

/// One season's artifact and optional schema override.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonConfig {
    pub model: PathBuf,
    /// Replaces the built-in feature order when present.
    #[serde(default)]
    pub features: Option<Vec<String>>,
}

impl SeasonConfig {
    #[must_use]
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self { model: model.into(), features: None }
    }
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8000, ssl: None }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            console: true,
            path: None,
            json: false,
            max_files: 10,
            rotation: LogRotation::default(),
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        let seasons = [WINTER, SPRING, SUMMER, FALL]
            .into_iter()
            .map(|season| {
                (season.to_owned(), SeasonConfig::new(format!("Data/xgb_{season}.json")))
            })
            .collect();

        Self {
            variant: ServingVariant::default(),
            target: DEFAULT_TARGET.to_owned(),
            legacy_model: PathBuf::from("Data/xgb_best_pcc.json"),
            seasons,
        }
    }
}
