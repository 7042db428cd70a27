//! # Model Registry
//!
//! One scoring artifact per season, loaded once at startup and shared read-only.

mod xgboost;

pub use xgboost::XgbModel;

use crate::error::{ForecastError, ScoreError, UnknownSeason};
use crate::schema::SchemaRegistry;
use crate::season::Season;
use fxhash::FxHashMap;
use helios_domain::config::ForecastConfig;
use std::fmt::Debug;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// The single capability a trained model exposes: one feature row in, one value out.
pub trait Scorer: Debug + Send + Sync {
    /// Scores a single row whose values are in schema order.
    ///
    /// # Errors
    /// Returns [`ScoreError`] if the artifact cannot produce a finite value for this row.
    fn score(&self, features: &[f64]) -> Result<f64, ScoreError>;

    /// Number of inputs the artifact was trained on, when the format records it.
    fn input_width(&self) -> Option<usize> {
        None
    }
}

pub type SharedScorer = Arc<dyn Scorer>;

/// Immutable season → model lookup.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: FxHashMap<Season, SharedScorer>,
}

impl ModelRegistry {
    pub fn new(models: impl IntoIterator<Item = (Season, SharedScorer)>) -> Self {
        Self { models: models.into_iter().collect() }
    }

    /// Loads every configured season's artifact and checks it against its schema.
    ///
    /// # Errors
    /// Fails if a season is missing or unknown, an artifact cannot be loaded,
    /// or an artifact's declared width differs from its schema.
    pub fn from_config(
        config: &ForecastConfig,
        schemas: &SchemaRegistry,
    ) -> Result<Self, ForecastError> {
        let mut entries = Vec::with_capacity(config.seasons.len());
        for (key, entry) in &config.seasons {
            let season = Season::parse(key).map_err(|e| {
                ForecastError::config(e.to_string()).with_context("forecast.seasons")
            })?;
            entries.push((season, entry));
        }

        if let Some(missing) = Season::iter().find(|s| !entries.iter().any(|(e, _)| e == s)) {
            return Err(ForecastError::config(format!("No model configured for {missing}"))
                .with_context("forecast.seasons"));
        }

        let mut models = FxHashMap::default();
        for (season, entry) in entries {
            let model = XgbModel::load(&entry.model)?;
            tracing::info!(
                %season,
                path = %entry.model.display(),
                inputs = model.num_feature(),
                "Model artifact loaded"
            );
            models.insert(season, Arc::new(model) as SharedScorer);
        }

        let registry = Self { models };
        registry.ensure_widths(schemas)?;
        Ok(registry)
    }

    /// Verifies that every model which declares an input width agrees with its schema.
    ///
    /// # Errors
    /// Returns [`ForecastError::WidthMismatch`] for the first disagreeing season, or
    /// [`ForecastError::Config`] if a model has no schema at all.
    pub fn ensure_widths(&self, schemas: &SchemaRegistry) -> Result<(), ForecastError> {
        for (season, model) in &self.models {
            let schema = schemas.schema(*season).ok_or_else(|| {
                ForecastError::config(format!("No feature schema for {season}"))
            })?;
            if let Some(width) = model.input_width()
                && width != schema.len()
            {
                return Err(ForecastError::WidthMismatch {
                    season: season.key().into(),
                    model: width,
                    schema: schema.len(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn model(&self, season: Season) -> Option<&SharedScorer> {
        self.models.get(&season)
    }

    /// # Errors
    /// Returns [`UnknownSeason`] if the label is not a recognized, registered season.
    pub fn get_model(&self, season: &str) -> Result<&SharedScorer, UnknownSeason> {
        Season::parse(season)
            .ok()
            .and_then(|s| self.model(s))
            .ok_or_else(|| UnknownSeason::new(season))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FeatureSchema;
    use helios_domain::config::SeasonConfig;
    use std::io::Write;

    #[derive(Debug)]
    struct Fixed {
        width: Option<usize>,
    }

    impl Scorer for Fixed {
        fn score(&self, _: &[f64]) -> Result<f64, ScoreError> {
            Ok(1.0)
        }

        fn input_width(&self) -> Option<usize> {
            self.width
        }
    }

    fn fixed(width: Option<usize>) -> SharedScorer {
        Arc::new(Fixed { width })
    }

    fn stump_json(num_feature: usize) -> String {
        format!(
            r#"{{"learner": {{
                "gradient_booster": {{"name": "gbtree", "model": {{"trees": [{{
                    "left_children": [-1], "right_children": [-1],
                    "split_indices": [0], "split_conditions": [3.0], "default_left": [0]
                }}]}}}},
                "learner_model_param": {{"base_score": "0", "num_feature": "{num_feature}"}},
                "objective": {{"name": "reg:squarederror"}}
            }}}}"#
        )
    }

    #[test]
    fn lookup_by_label() {
        let registry = ModelRegistry::new(Season::iter().map(|s| (s, fixed(None))));
        for label in ["winter", "Spring", " SUMMER ", "fall"] {
            assert!(registry.get_model(label).is_ok(), "{label}");
        }
        assert_eq!(registry.get_model("autumn").unwrap_err().input(), "autumn");
    }

    #[test]
    fn width_check_catches_mismatch() {
        let schemas = SchemaRegistry::builtin();
        let ok = ModelRegistry::new([(Season::Summer, fixed(Some(9))), (Season::Fall, fixed(None))]);
        assert!(ok.ensure_widths(&schemas).is_ok());

        let bad = ModelRegistry::new([(Season::Winter, fixed(Some(9)))]);
        match bad.ensure_widths(&schemas).unwrap_err() {
            ForecastError::WidthMismatch { model, schema, .. } => {
                assert_eq!((model, schema), (9, 11));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_config_loads_all_seasons() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = SchemaRegistry::new(
            Season::iter().map(|s| FeatureSchema::new(s, ["a", "b"]).unwrap()),
        );

        let mut config = ForecastConfig::default();
        for season in Season::iter() {
            let path = dir.path().join(format!("{season}.json"));
            std::fs::File::create(&path).unwrap().write_all(stump_json(2).as_bytes()).unwrap();
            config.seasons.insert(season.key().to_owned(), SeasonConfig::new(path));
        }

        let registry = ModelRegistry::from_config(&config, &schemas).unwrap();
        assert_eq!(registry.get_model("winter").unwrap().score(&[0.0, 0.0]).unwrap(), 3.0);
    }

    #[test]
    fn from_config_rejects_missing_season() {
        let mut config = ForecastConfig::default();
        config.seasons.remove("fall");

        let err = ModelRegistry::from_config(&config, &SchemaRegistry::builtin()).unwrap_err();
        assert!(err.to_string().contains("fall"), "{err}");
    }

    #[test]
    fn from_config_rejects_width_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ForecastConfig::default();
        for season in Season::iter() {
            let path = dir.path().join(format!("{season}.json"));
            std::fs::write(&path, stump_json(3)).unwrap();
            config.seasons.insert(season.key().to_owned(), SeasonConfig::new(path));
        }

        let err = ModelRegistry::from_config(&config, &SchemaRegistry::builtin()).unwrap_err();
        assert!(matches!(err, ForecastError::WidthMismatch { model: 3, .. }));
    }

    #[test]
    fn from_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ForecastConfig::default();
        for season in Season::iter() {
            config
                .seasons
                .insert(season.key().to_owned(), SeasonConfig::new(dir.path().join("none.json")));
        }

        let err = ModelRegistry::from_config(&config, &SchemaRegistry::builtin()).unwrap_err();
        assert!(matches!(err, ForecastError::Io { .. }));
    }
}
