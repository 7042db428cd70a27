#![cfg(feature = "server")]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use helios_kernel::server::router::system_router;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_up_with_no_cache_headers() {
    let (router, _api) = system_router::<()>().split_for_parts();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store, no-cache, must-revalidate"
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "up");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn health_is_documented() {
    let (_router, api) = system_router::<()>().split_for_parts();
    assert!(api.paths.paths.contains_key("/health"));
}
