mod common;

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{FULL_REPLY, FakeCapability, jpeg_b64};
use five_s_audit::{AnalysisResult, AssessmentPipeline, ErrorBody, http::router};
use serde_json::json;
use tower::ServiceExt;

fn app(fake: FakeCapability) -> axum::Router {
    router(Arc::new(AssessmentPipeline::new(Arc::new(fake))))
}

fn analyze_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze-5s")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let response = app(FakeCapability::replying(FULL_REPLY))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn analyze_returns_normalized_result() {
    let response = app(FakeCapability::replying(FULL_REPLY))
        .oneshot(analyze_request(json!({
            "images": [jpeg_b64()],
            "workspace_name": "Machining Cell 2"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let result: AnalysisResult = body_json(response).await;
    assert_eq!(result.overall_score, 62);
    assert_eq!(result.scores.shine, 58);
}

#[tokio::test]
async fn missing_credential_returns_hint() {
    let response = app(FakeCapability::unavailable())
        .oneshot(analyze_request(json!({ "images": [jpeg_b64()], "workspace_name": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorBody = body_json(response).await;
    assert!(body.error.contains("unavailable"));
    assert!(body.hint.unwrap().contains("ANTHROPIC_API_KEY"));
}

#[tokio::test]
async fn empty_images_is_bad_request_without_hint() {
    let response = app(FakeCapability::replying(FULL_REPLY))
        .oneshot(analyze_request(json!({ "images": [], "workspace_name": "Dock" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.error, "No images provided");
    assert!(body.hint.is_none());
}

#[tokio::test]
async fn unparseable_model_reply_is_bad_gateway() {
    let response = app(FakeCapability::replying("no json here"))
        .oneshot(analyze_request(json!({ "images": [jpeg_b64()] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn malformed_request_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/analyze-5s")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"images\": ["))
        .unwrap();
    let response = app(FakeCapability::replying(FULL_REPLY))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert!(body.error.starts_with("Invalid request body"));
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/analyze-5s")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app(FakeCapability::replying(FULL_REPLY))
        .oneshot(request)
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
