use crate::error::PipelineError;
use crate::transport::http::types::ErrorResponse;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::Conflict(_) => StatusCode::CONFLICT,
            PipelineError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::Upstream { .. } | PipelineError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PipelineError::Parse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = self.details();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, details = ?details, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
                details,
            }),
        )
            .into_response()
    }
}

pub fn json_422(err: JsonRejection, expected: &str) -> Response {
    warn!(error = %err, "rejected malformed JSON body");
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            success: false,
            error: format!("Invalid JSON body: {} (expected: {})", err, expected),
            details: None,
        }),
    )
        .into_response()
}
