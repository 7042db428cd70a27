//! # Feature Validator
//!
//! Turns a caller's raw values into a numeric vector in schema order, or says precisely
//! what is wrong with them. Checks run in a fixed order: season, then count, then each
//! value from the first position onward.

use crate::error::FeatureValidationError;
use crate::schema::{FeatureSchema, SchemaRegistry};
use crate::season::Season;

/// A raw feature value that may or may not convert to a finite float.
pub trait FeatureValue {
    fn to_finite(&self) -> Option<f64>;
}

impl FeatureValue for str {
    fn to_finite(&self) -> Option<f64> {
        let trimmed = self.trim();
        // Rust also accepts "infinity" and "nan" spellings; both are rejected below.
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl FeatureValue for String {
    fn to_finite(&self) -> Option<f64> {
        self.as_str().to_finite()
    }
}

impl FeatureValue for f64 {
    fn to_finite(&self) -> Option<f64> {
        Some(*self).filter(|v| v.is_finite())
    }
}

impl FeatureValue for f32 {
    fn to_finite(&self) -> Option<f64> {
        f64::from(*self).to_finite()
    }
}

impl<T: FeatureValue + ?Sized> FeatureValue for &T {
    fn to_finite(&self) -> Option<f64> {
        (**self).to_finite()
    }
}

/// A vector proven to satisfy its season's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFeatures {
    season: Season,
    values: Vec<f64>,
}

impl ValidatedFeatures {
    #[must_use]
    pub const fn season(&self) -> Season {
        self.season
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureValidator<'a> {
    schemas: &'a SchemaRegistry,
}

impl<'a> FeatureValidator<'a> {
    #[must_use]
    pub const fn new(schemas: &'a SchemaRegistry) -> Self {
        Self { schemas }
    }

    /// Resolves the season, then checks `values` against its schema.
    ///
    /// # Errors
    /// Returns the first [`FeatureValidationError`] found.
    pub fn validate<V: FeatureValue>(
        &self,
        season: &str,
        values: &[V],
    ) -> Result<ValidatedFeatures, FeatureValidationError> {
        let schema = self.schemas.get_schema(season)?;
        validate_against(schema, values)
    }
}

/// Count and conversion checks against an already-resolved schema.
///
/// # Errors
/// Returns [`FeatureValidationError::FeatureCountMismatch`] or
/// [`FeatureValidationError::NonNumericFeature`] for the first offending position.
pub fn validate_against<V: FeatureValue>(
    schema: &FeatureSchema,
    values: &[V],
) -> Result<ValidatedFeatures, FeatureValidationError> {
    if values.len() != schema.len() {
        return Err(FeatureValidationError::FeatureCountMismatch {
            expected: schema.len(),
            received: values.len(),
        });
    }

    let values = values
        .iter()
        .enumerate()
        .map(|(position, raw)| {
            raw.to_finite().ok_or_else(|| FeatureValidationError::NonNumericFeature {
                position,
                feature: schema.name_at(position).unwrap_or_default().to_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidatedFeatures { season: schema.season(), values })
}
