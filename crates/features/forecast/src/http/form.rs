//! Typed views over decoded `application/x-www-form-urlencoded` bodies.
//!
//! Bodies are extracted as raw key/value pairs so repeated keys survive, then narrowed
//! into the structs below. Values stay strings; numeric conversion belongs to the validator.

use super::error::ApiError;
use serde::Serialize;
use utoipa::ToSchema;

pub(super) type FormPairs = Vec<(String, String)>;

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// `POST /features` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeaturesRequest {
    /// Season label (winter, spring, summer, fall; case-insensitive)
    #[schema(example = "winter")]
    pub season: String,
}

impl FeaturesRequest {
    pub(super) fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let season = first(pairs, "season").ok_or(ApiError::MissingField { field: "season" })?;
        Ok(Self { season: season.to_owned() })
    }
}

/// Seasonal `POST /predict` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PredictRequest {
    /// Season label (winter, spring, summer, fall; case-insensitive)
    #[schema(example = "summer")]
    pub season: String,
    /// Feature values in the order returned by `/features`; repeat the key once per value
    pub features: Vec<String>,
}

impl PredictRequest {
    pub(super) fn from_pairs(pairs: FormPairs) -> Result<Self, ApiError> {
        let season = first(&pairs, "season")
            .ok_or(ApiError::MissingField { field: "season" })?
            .to_owned();
        let features =
            pairs.into_iter().filter(|(k, _)| k == "features").map(|(_, v)| v).collect();
        Ok(Self { season, features })
    }
}

/// Legacy `POST /predict` body.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LegacyPredictRequest {
    pub feature1: f64,
    pub feature2: f64,
    pub feature3: f64,
    pub feature4: f64,
    pub feature5: f64,
    pub feature6: f64,
    pub feature7: f64,
    pub feature8: f64,
    pub feature9: f64,
    pub feature10: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> FormPairs {
        raw.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn repeated_features_keep_their_order() {
        let form = pairs(&[("features", "3"), ("season", "fall"), ("features", "1"), ("features", "2")]);
        let request = PredictRequest::from_pairs(form).unwrap();
        assert_eq!(request.season, "fall");
        assert_eq!(request.features, ["3", "1", "2"]);
    }

    #[test]
    fn missing_season_is_reported() {
        let err = PredictRequest::from_pairs(pairs(&[("features", "1")])).unwrap_err();
        assert!(matches!(err, ApiError::MissingField { field: "season" }));
        assert!(FeaturesRequest::from_pairs(&[]).is_err());
    }

    #[test]
    fn no_features_is_an_empty_vector() {
        let request = PredictRequest::from_pairs(pairs(&[("season", "winter")])).unwrap();
        assert!(request.features.is_empty());
    }
}
