//! # Schema Registry
//!
//! Each seasonal model was trained on its own selection and ordering of sensor columns.
//! The registry is the single source of truth for how many values a request must carry
//! and what each position means; callers discover it through [`SchemaRegistry::list_feature_names`].

use crate::error::{ForecastError, UnknownSeason};
use crate::season::Season;
use fxhash::{FxHashMap, FxHashSet};
use helios_domain::config::ForecastConfig;
use std::sync::Arc;
use strum::IntoEnumIterator;

const WINTER_FEATURES: [&str; 11] = [
    "geff_reference_w_m2",
    "geff_test_w_m2",
    "module_surface_temperature2_degree_centigrade",
    "module_surface_temperature1_degree_centigrade",
    "temperature_reference_cell_deg_c",
    "temperature_test_deg_c",
    "ambient_temp._degree_centigrade",
    "relative_humidity",
    "soiling_loss_index_isc",
    "soiling_loss_index_geff",
    "wind_speed_m_s",
];

const SPRING_FEATURES: [&str; 11] = [
    "geff_reference_w_m2",
    "geff_test_w_m2",
    "module_surface_temperature2_degree_centigrade",
    "temperature_test_deg_c",
    "module_surface_temperature1_degree_centigrade",
    "temperature_reference_cell_deg_c",
    "ambient_temp._degree_centigrade",
    "relative_humidity",
    "wind_speed_m_s",
    "soiling_loss_index_isc",
    "soiling_loss_index_geff",
];

const SUMMER_FEATURES: [&str; 9] = [
    "temperature_test_deg_c",
    "temperature_reference_cell_deg_c",
    "module_surface_temperature2_degree_centigrade",
    "module_surface_temperature1_degree_centigrade",
    "ambient_temp._degree_centigrade",
    "relative_humidity",
    "wind_speed_m_s",
    "soiling_loss_index_geff",
    "soiling_loss_index_isc",
];

const FALL_FEATURES: [&str; 9] = [
    "module_surface_temperature2_degree_centigrade",
    "module_surface_temperature1_degree_centigrade",
    "temperature_reference_cell_deg_c",
    "temperature_test_deg_c",
    "ambient_temp._degree_centigrade",
    "relative_humidity",
    "soiling_loss_index_geff",
    "soiling_loss_index_isc",
    "wind_speed_m_s",
];

/// Ordered feature names one season's model expects. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    season: Season,
    names: Arc<[String]>,
}

impl FeatureSchema {
    /// Builds a schema, rejecting empty lists and repeated names.
    ///
    /// # Errors
    /// Returns [`ForecastError::Config`] if `names` is empty or contains duplicates.
    pub fn new<I, S>(season: Season, names: I) -> Result<Self, ForecastError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Arc<[String]> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ForecastError::config(format!("Feature schema for {season} is empty")));
        }

        let mut seen = FxHashSet::default();
        if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(ForecastError::config(format!(
                "Feature schema for {season} lists '{dup}' more than once"
            )));
        }

        Ok(Self { season, names })
    }

    /// The feature order the bundled models were trained with.
    #[must_use]
    pub fn builtin(season: Season) -> Self {
        let names: &[&str] = match season {
            Season::Winter => &WINTER_FEATURES,
            Season::Spring => &SPRING_FEATURES,
            Season::Summer => &SUMMER_FEATURES,
            Season::Fall => &FALL_FEATURES,
        };
        Self { season, names: names.iter().map(|&name| name.to_owned()).collect() }
    }

    #[must_use]
    pub const fn season(&self) -> Season {
        self.season
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn name_at(&self, position: usize) -> Option<&str> {
        self.names.get(position).map(String::as_str)
    }
}

/// Immutable season → schema lookup, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: FxHashMap<Season, FeatureSchema>,
}

impl SchemaRegistry {
    /// Registry holding the built-in schema for every season.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(Season::iter().map(FeatureSchema::builtin))
    }

    /// Registry over an arbitrary set of schemas; later entries replace earlier ones.
    pub fn new(schemas: impl IntoIterator<Item = FeatureSchema>) -> Self {
        Self { schemas: schemas.into_iter().map(|schema| (schema.season(), schema)).collect() }
    }

    /// Built-in schemas with per-season overrides from configuration applied.
    ///
    /// # Errors
    /// Returns [`ForecastError::Config`] for unknown season keys or invalid overrides.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, ForecastError> {
        let mut registry = Self::builtin();

        for (key, entry) in &config.seasons {
            let season = Season::parse(key).map_err(|e| {
                ForecastError::config(e.to_string()).with_context("forecast.seasons")
            })?;
            if let Some(features) = &entry.features {
                let schema = FeatureSchema::new(season, features.iter().cloned())
                    .map_err(|e| e.with_context("forecast.seasons.*.features"))?;
                tracing::info!(%season, features = schema.len(), "Using configured feature schema");
                registry.schemas.insert(season, schema);
            }
        }

        Ok(registry)
    }

    /// Typed lookup; `None` only for registries built without that season.
    #[must_use]
    pub fn schema(&self, season: Season) -> Option<&FeatureSchema> {
        self.schemas.get(&season)
    }

    /// Resolves raw caller input to its schema.
    ///
    /// # Errors
    /// Returns [`UnknownSeason`] if the label is not a recognized, registered season.
    pub fn get_schema(&self, season: &str) -> Result<&FeatureSchema, UnknownSeason> {
        Season::parse(season)
            .ok()
            .and_then(|s| self.schema(s))
            .ok_or_else(|| UnknownSeason::new(season))
    }

    /// The discovery contract: which features, in which order, a prediction must supply.
    ///
    /// # Errors
    /// Returns [`UnknownSeason`] under the same conditions as [`Self::get_schema`].
    pub fn list_feature_names(&self, season: &str) -> Result<&[String], UnknownSeason> {
        self.get_schema(season).map(FeatureSchema::names)
    }

    /// # Errors
    /// Returns [`UnknownSeason`] under the same conditions as [`Self::get_schema`].
    pub fn feature_count(&self, season: &str) -> Result<usize, UnknownSeason> {
        self.get_schema(season).map(FeatureSchema::len)
    }

    pub fn seasons(&self) -> impl Iterator<Item = Season> + '_ {
        self.schemas.keys().copied()
    }
}
