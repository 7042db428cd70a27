//! HTTP transport for the forecast slice.
//!
//! Form fields in, JSON out. All decisions about validity are made by the core; this
//! layer only narrows untyped form pairs and maps errors to status codes.

mod error;
mod form;

pub use self::error::{ApiError, ErrorResponse};
pub use self::form::{FeaturesRequest, LegacyPredictRequest, PredictRequest};

use self::form::FormPairs;
use crate::legacy::LegacyRequest;
use crate::{DispatchError, Forecast, PredictionDispatcher};
use axum::extract::State;
use axum::{Form, Json};
use helios_kernel::domain::config::ServingVariant;
use helios_kernel::domain::constants::FORECAST_TAG;
use helios_kernel::server::ApiState;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Ordered feature names for a season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeaturesResponse {
    pub features: Vec<String>,
}

/// Seasonal prediction
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PredictResponse {
    /// Predicted value, rounded to four decimals
    pub result: f64,
    /// Predicted quantity
    #[schema(example = "control_ppc_active_power_1m")]
    pub target: String,
    /// Capitalized season
    #[schema(example = "Winter")]
    pub season: &'static str,
}

/// Single-model prediction
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LegacyPredictResponse {
    /// Predicted value, rounded to two decimals
    pub result: f64,
}

fn dispatcher(state: &ApiState) -> Result<&PredictionDispatcher, ApiError> {
    state.get_slice::<Forecast>().and_then(Forecast::dispatcher).ok_or(ApiError::SliceUnavailable)
}

#[utoipa::path(
    post,
    path = "/features",
    request_body(content = FeaturesRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = OK, description = "Feature names in model order", body = FeaturesResponse),
        (status = BAD_REQUEST, description = "Unknown or missing season", body = ErrorResponse),
    ),
    tag = FORECAST_TAG,
)]
#[allow(clippy::unused_async)]
pub(crate) async fn features_handler(
    State(state): State<ApiState>,
    Form(pairs): Form<FormPairs>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let request = FeaturesRequest::from_pairs(&pairs)?;
    let names = dispatcher(&state)?
        .schemas()
        .list_feature_names(&request.season)
        .map_err(DispatchError::from)?;

    Ok(Json(FeaturesResponse { features: names.to_vec() }))
}

#[utoipa::path(
    post,
    path = "/predict",
    request_body(content = PredictRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = OK, description = "Rounded prediction", body = PredictResponse),
        (status = BAD_REQUEST, description = "Invalid season or feature vector", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Model failure", body = ErrorResponse),
    ),
    tag = FORECAST_TAG,
)]
#[allow(clippy::unused_async)]
pub(crate) async fn predict_handler(
    State(state): State<ApiState>,
    Form(pairs): Form<FormPairs>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request = PredictRequest::from_pairs(pairs)?;
    let prediction = dispatcher(&state)?.predict(&request.season, &request.features)?;

    Ok(Json(PredictResponse {
        result: prediction.result,
        target: prediction.target.to_string(),
        season: prediction.season_label(),
    }))
}

#[utoipa::path(
    post,
    path = "/predict",
    request_body(content = LegacyPredictRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = OK, description = "Rounded prediction", body = LegacyPredictResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Missing or non-numeric field", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Model failure", body = ErrorResponse),
    ),
    tag = FORECAST_TAG,
)]
#[allow(clippy::unused_async)]
pub(crate) async fn legacy_predict_handler(
    State(state): State<ApiState>,
    Form(pairs): Form<FormPairs>,
) -> Result<Json<LegacyPredictResponse>, ApiError> {
    let predictor = state
        .get_slice::<Forecast>()
        .and_then(Forecast::legacy_predictor)
        .ok_or(ApiError::SliceUnavailable)?;

    let request = LegacyRequest::from_pairs(&pairs)?;
    let result = predictor.predict(&request)?;

    Ok(Json(LegacyPredictResponse { result }))
}

/// Forecast routes for the configured variant.
pub fn router(variant: ServingVariant) -> OpenApiRouter<ApiState> {
    let router = OpenApiRouter::new();
    match variant {
        ServingVariant::Seasonal => {
            router.routes(routes!(features_handler)).routes(routes!(predict_handler))
        },
        ServingVariant::Legacy => router.routes(routes!(legacy_predict_handler)),
    }
}
