use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::schemas::HealthResponse;

/// `GET /health` -- liveness probe.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    summary = "Health check",
    description = "Returns service status and version.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> impl IntoResponse {
    let body = HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    };

    (StatusCode::OK, Json(body))
}
