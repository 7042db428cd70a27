use axum::Router;
use axum::response::Html;
use axum::routing::get;
use helios::kernel::prelude::ApiState;
use helios::server::router::{forecast_router, system_router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(OpenApi)]
#[openapi(info(title = "Helios", description = "Seasonal solar power prediction"))]
struct ApiDoc;

#[allow(clippy::unused_async)]
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Router {
    let api = ApiDoc::openapi();
    let variant = state.config.forecast.variant;

    // Separate the OpenAPI routes and the API documentation object
    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(api)
        .merge(system_router())
        .merge(forecast_router(variant))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    // Create the Scalar UI routes
    let scalar_routes = Scalar::with_url("/api", api_doc);

    Router::new().route("/", get(index)).merge(openapi_routes).merge(scalar_routes)
}
