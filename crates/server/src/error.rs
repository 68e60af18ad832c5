//! Errors returned by the one-shot endpoint.

use ak_core::engine::PipelineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(PipelineError),

    #[error("{0}")]
    Failed(PipelineError),

    #[error("Assessment did not finish within {} seconds", .0.as_secs())]
    Timeout(Duration),
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        if error.is_validation() {
            Self::Rejected(error)
        } else {
            Self::Failed(error)
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
