//! # Prediction Dispatcher
//!
//! season → schema + model → validated vector → one scoring call → rounded result.

use crate::error::DispatchError;
use crate::model::{ModelRegistry, SharedScorer};
use crate::schema::{FeatureSchema, SchemaRegistry};
use crate::season::Season;
use crate::validator::{FeatureValue, validate_against};
use serde::Serialize;
use std::sync::Arc;

/// Decimal places reported by the seasonal service.
pub const SEASONAL_PRECISION: u32 = 4;
/// Decimal places reported by the single-model service.
pub const LEGACY_PRECISION: u32 = 2;

/// Rounds the exact binary value to `decimals` places, ties to even.
///
/// Formatting rounds from the exact expansion of `value`, so `0.125` becomes `0.12` and
/// `1500.03125` becomes `1500.0312`. Non-finite values are returned unchanged.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let precision = usize::try_from(decimals).unwrap_or(usize::MAX);
    format!("{value:.precision$}").parse().unwrap_or(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub result: f64,
    pub target: Arc<str>,
    pub season: Season,
}

impl PredictionResult {
    /// Capitalized season label for display.
    #[must_use]
    pub const fn season_label(&self) -> &'static str {
        self.season.display_name()
    }
}

#[derive(Debug, Clone)]
pub struct PredictionDispatcher {
    schemas: Arc<SchemaRegistry>,
    models: Arc<ModelRegistry>,
    target: Arc<str>,
}

impl PredictionDispatcher {
    pub fn new(
        schemas: Arc<SchemaRegistry>,
        models: Arc<ModelRegistry>,
        target: impl Into<Arc<str>>,
    ) -> Self {
        Self { schemas, models, target: target.into() }
    }

    #[must_use]
    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Resolves both registries for a season before anything else is examined.
    fn resolve(&self, season: &str) -> Result<(&FeatureSchema, &SharedScorer), DispatchError> {
        let schema = self.schemas.get_schema(season)?;
        let model = self.models.get_model(season)?;
        Ok((schema, model))
    }

    /// Validates `values` against the season's schema and scores them once.
    ///
    /// # Errors
    /// Returns the validation failure untouched, or
    /// [`DispatchError::ModelInvocationFailure`] if scoring fails. The model is never
    /// called for input that failed validation.
    #[tracing::instrument(level = "debug", skip(self, values), fields(count = values.len()))]
    pub fn predict<V: FeatureValue>(
        &self,
        season: &str,
        values: &[V],
    ) -> Result<PredictionResult, DispatchError> {
        let (schema, model) = self.resolve(season)?;
        let season = schema.season();

        let features = validate_against(schema, values)?;
        let raw = model
            .score(features.values())
            .map_err(|source| DispatchError::ModelInvocationFailure { season, source })?;

        let result = round_to(raw, SEASONAL_PRECISION);
        tracing::debug!(%season, raw, result, "Prediction scored");

        Ok(PredictionResult { result, target: Arc::clone(&self.target), season })
    }
}
