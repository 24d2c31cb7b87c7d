use crate::transport::http::types::{AppState, HealthResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Catalog and object store reachable", body = HealthResponse),
        (status = 503, description = "A backend is unreachable", body = HealthResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.book_service.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                success: true,
                status: "ok".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    success: false,
                    status: "unhealthy".to_string(),
                }),
            )
                .into_response()
        }
    }
}
