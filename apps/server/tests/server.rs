use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use helios::domain::config::{ApiConfig, SeasonConfig, SslConfig};
use helios::features::forecast::{SchemaRegistry, Season};
use helios_server::Server;
use std::path::Path;
use tower::ServiceExt;

/// Every weight 1, bias 0, base score 0: the prediction is the plain sum.
fn sum_artifact(num_feature: usize) -> String {
    let weights = vec!["1.0"; num_feature].join(", ");
    format!(
        r#"{{"learner": {{
            "gradient_booster": {{"name": "gblinear", "model": {{"weights": [{weights}, 0.0]}}}},
            "learner_model_param": {{"base_score": "0E0", "num_feature": "{num_feature}"}},
            "objective": {{"name": "reg:squarederror"}}
        }}}}"#
    )
}

fn config_with_artifacts(dir: &Path) -> ApiConfig {
    let schemas = SchemaRegistry::builtin();
    let mut cfg = ApiConfig::default();
    for season in [Season::Winter, Season::Spring, Season::Summer, Season::Fall] {
        let path = dir.join(format!("xgb_{season}.json"));
        std::fs::write(&path, sum_artifact(schemas.schema(season).unwrap().len())).unwrap();
        cfg.forecast.seasons.insert(season.key().to_owned(), SeasonConfig::new(path));
    }
    cfg
}

fn server() -> (tempfile::TempDir, Server) {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_with_artifacts(dir.path());
    let server = Server::builder().config(cfg).port(0).build().unwrap();
    (dir, server)
}

async fn get(server: Server, uri: &str) -> (StatusCode, String) {
    let response = server
        .into_router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[test]
fn build_registers_forecast_slice() {
    let (_dir, server) = server();
    let names: Vec<_> = server.state().slice_names().collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with("Forecast"));
    assert_eq!(server.state().config.server.port, 0);
}

#[test]
fn build_fails_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = ApiConfig::default();
    for season in ["winter", "spring", "summer", "fall"] {
        cfg.forecast
            .seasons
            .insert(season.to_owned(), SeasonConfig::new(dir.path().join("missing.json")));
    }

    let err = Server::builder().config(cfg).build().unwrap_err();
    assert!(err.to_string().contains("bootstrap"), "{err}");
}

#[test]
fn build_fails_on_missing_certificate() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config_with_artifacts(dir.path());
    cfg.server.ssl =
        Some(SslConfig { cert: dir.path().join("cert.pem"), key: dir.path().join("key.pem") });

    let err = Server::builder().config(cfg).build().unwrap_err();
    assert!(err.to_string().contains("SSL certificate not found"), "{err}");
}

#[tokio::test]
async fn entry_page_is_served() {
    let (_dir, server) = server();
    let (status, body) = get(server, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<form"));
}

#[tokio::test]
async fn health_and_docs_are_mounted() {
    let (_dir, server) = server();
    let (status, _) = get(server, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (_dir, server) = self::server();
    let (status, body) = get(server, "/api").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/predict"), "OpenAPI document should list /predict");
}

#[tokio::test]
async fn predict_end_to_end() {
    let (_dir, server) = server();
    let body = std::iter::once("season=Summer".to_owned())
        .chain((1..=9).map(|i| format!("features={i}")))
        .collect::<Vec<_>>()
        .join("&");

    let response = server
        .into_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"result": 45.0, "target": "control_ppc_active_power_1m", "season": "Summer"})
    );
}

#[test]
fn shipped_config_loads() {
    use helios::kernel::config::load_config;

    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../server.toml");
    let cfg: ApiConfig = load_config(Some(path)).unwrap();

    assert_eq!(cfg.server.port, 8000);
    assert_eq!(cfg.log.level, "info");
    assert_eq!(cfg.forecast.seasons.len(), 4);
}
