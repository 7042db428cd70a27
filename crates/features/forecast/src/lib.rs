//! Forecast feature slice: seasonal model dispatch and feature-contract validation.
//!
//! Startup builds a [`SchemaRegistry`] and a [`ModelRegistry`] from configuration and
//! hands both to a [`PredictionDispatcher`]. Everything is read-only afterwards.

mod dispatcher;
mod error;
mod legacy;
mod model;
mod schema;
mod season;
mod validator;

#[cfg(feature = "server")]
pub mod http;

pub use crate::dispatcher::{
    LEGACY_PRECISION, PredictionDispatcher, PredictionResult, SEASONAL_PRECISION, round_to,
};
pub use crate::error::{
    ArtifactError, DispatchError, FeatureValidationError, ForecastError, LegacyFieldError,
    ScoreError, UnknownSeason,
};
pub use crate::legacy::{LEGACY_FIELDS, LegacyPredictor, LegacyRequest};
pub use crate::model::{ModelRegistry, Scorer, SharedScorer, XgbModel};
pub use crate::schema::{FeatureSchema, SchemaRegistry};
pub use crate::season::Season;
pub use crate::validator::{FeatureValidator, FeatureValue, ValidatedFeatures, validate_against};

use helios_kernel::domain::config::{ApiConfig, ServingVariant};
use helios_kernel::domain::registry::{FeatureSlice, InitializedSlice};
use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

/// Which prediction contract this process serves.
#[derive(Debug, Clone)]
pub enum ForecastEngine {
    Seasonal(PredictionDispatcher),
    Legacy(LegacyPredictor),
}

#[derive(Debug, Clone)]
pub struct ForecastInner {
    pub engine: ForecastEngine,
}

/// Forecast feature state.
#[derive(Debug, Clone)]
pub struct Forecast {
    inner: Arc<ForecastInner>,
}

impl Forecast {
    pub fn new(inner: ForecastInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Seasonal slice over pre-built registries.
    pub fn seasonal(dispatcher: PredictionDispatcher) -> Self {
        Self::new(ForecastInner { engine: ForecastEngine::Seasonal(dispatcher) })
    }

    pub fn legacy(predictor: LegacyPredictor) -> Self {
        Self::new(ForecastInner { engine: ForecastEngine::Legacy(predictor) })
    }

    #[must_use]
    pub fn dispatcher(&self) -> Option<&PredictionDispatcher> {
        match &self.inner.engine {
            ForecastEngine::Seasonal(dispatcher) => Some(dispatcher),
            ForecastEngine::Legacy(_) => None,
        }
    }

    #[must_use]
    pub fn legacy_predictor(&self) -> Option<&LegacyPredictor> {
        match &self.inner.engine {
            ForecastEngine::Legacy(predictor) => Some(predictor),
            ForecastEngine::Seasonal(_) => None,
        }
    }
}

impl Deref for Forecast {
    type Target = ForecastInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FeatureSlice for Forecast {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds the registries for the configured variant, loading every artifact.
///
/// # Errors
/// Any configuration or artifact problem; all of them are fatal at startup.
pub fn build(config: &ApiConfig) -> Result<Forecast, ForecastError> {
    let cfg = &config.forecast;

    let forecast = match cfg.variant {
        ServingVariant::Seasonal => {
            let schemas = SchemaRegistry::from_config(cfg)?;
            let models = ModelRegistry::from_config(cfg, &schemas)?;
            let dispatcher =
                PredictionDispatcher::new(Arc::new(schemas), Arc::new(models), cfg.target.as_str());
            Forecast::seasonal(dispatcher)
        },
        ServingVariant::Legacy => Forecast::legacy(LegacyPredictor::from_config(cfg)?),
    };

    Ok(forecast)
}

/// Initialize the forecast feature.
///
/// # Errors
/// See [`build`].
pub fn init(config: &ApiConfig) -> Result<InitializedSlice, ForecastError> {
    let forecast = build(config)?;
    tracing::info!(variant = ?config.forecast.variant, "Forecast slice initialized");
    Ok(InitializedSlice::new(forecast))
}
