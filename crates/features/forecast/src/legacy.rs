//! The single-model service: ten named fields, one artifact, two decimals.

use crate::dispatcher::{LEGACY_PRECISION, round_to};
use crate::error::{ForecastError, LegacyFieldError, ScoreError};
use crate::model::{SharedScorer, XgbModel};
use crate::validator::FeatureValue;
use helios_domain::config::ForecastConfig;
use std::sync::Arc;

pub const LEGACY_FIELDS: [&str; 10] = [
    "feature1", "feature2", "feature3", "feature4", "feature5", "feature6", "feature7",
    "feature8", "feature9", "feature10",
];

/// Ten values in `feature1..feature10` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegacyRequest {
    values: [f64; 10],
}

impl LegacyRequest {
    #[must_use]
    pub const fn new(values: [f64; 10]) -> Self {
        Self { values }
    }

    /// Picks `feature1..feature10` out of decoded form pairs. Unrelated keys are ignored;
    /// when a key repeats, the first occurrence wins.
    ///
    /// # Errors
    /// Returns [`LegacyFieldError`] naming the first missing or non-numeric field.
    pub fn from_pairs<K, V>(pairs: &[(K, V)]) -> Result<Self, LegacyFieldError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values = [0.0; 10];
        for (slot, field) in values.iter_mut().zip(LEGACY_FIELDS) {
            let raw = pairs
                .iter()
                .find(|(k, _)| k.as_ref() == field)
                .map(|(_, v)| v.as_ref())
                .ok_or(LegacyFieldError::Missing { field })?;
            *slot = raw.to_finite().ok_or(LegacyFieldError::NonNumeric { field })?;
        }
        Ok(Self { values })
    }

    #[must_use]
    pub const fn values(&self) -> &[f64; 10] {
        &self.values
    }
}

#[derive(Debug, Clone)]
pub struct LegacyPredictor {
    model: SharedScorer,
}

impl LegacyPredictor {
    pub const fn new(model: SharedScorer) -> Self {
        Self { model }
    }

    /// Loads `forecast.legacy_model`.
    ///
    /// # Errors
    /// Fails if the artifact cannot be loaded or does not take ten inputs.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, ForecastError> {
        let model = XgbModel::load(&config.legacy_model)?;
        if model.num_feature() != LEGACY_FIELDS.len() {
            return Err(ForecastError::WidthMismatch {
                season: "legacy".into(),
                model: model.num_feature(),
                schema: LEGACY_FIELDS.len(),
            });
        }
        tracing::info!(path = %config.legacy_model.display(), "Legacy model artifact loaded");
        Ok(Self::new(Arc::new(model)))
    }

    /// Scores one request, rounded to two decimals.
    ///
    /// # Errors
    /// Propagates the artifact's [`ScoreError`].
    pub fn predict(&self, request: &LegacyRequest) -> Result<f64, ScoreError> {
        let raw = self.model.score(request.values())?;
        Ok(round_to(raw, LEGACY_PRECISION))
    }
}
