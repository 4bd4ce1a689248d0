//! HTTP transport for five-s-audit
//!
//! Axum server exposing the assessment pipeline as `POST /analyze-5s`, plus a
//! plain health check. CORS is open, matching the browser client's needs.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{AuditError, ErrorBody};
use crate::models::Submission;
use crate::pipeline::AssessmentPipeline;

/// Four phone photos as base64 comfortably exceed axum's 2 MiB default
pub const MAX_BODY_BYTES: usize = 40 * 1024 * 1024;

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub pipeline: Arc<AssessmentPipeline>,
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_body())).into_response()
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Run one assessment; returns the normalized result or `{error, hint?}`
pub async fn analyze_handler(
    State(state): State<HttpState>,
    payload: std::result::Result<Json<Submission>, JsonRejection>,
) -> Response {
    let Json(submission) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("Rejected analyze request: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(format!(
                    "Invalid request body: {}",
                    rejection.body_text()
                ))),
            )
                .into_response();
        }
    };

    match state.pipeline.run(&submission).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn router(pipeline: Arc<AssessmentPipeline>) -> Router {
    let state = HttpState { pipeline };
    Router::new()
        .route("/health", get(health_handler))
        .route("/analyze-5s", post(analyze_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_http_server(
    pipeline: Arc<AssessmentPipeline>,
    bind: std::net::SocketAddr,
) -> anyhow::Result<()> {
    let app = router(pipeline);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!("Starting HTTP server on {} (POST /analyze-5s)", bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
