//! `POST /assess`: one assessment, answered when it is done.

use crate::error::ApiError;
use crate::AppState;
use ak_core::emitter::{DiscardSink, EventEmitter};
use ak_protocol::assessment_models::Assessment;
use ak_protocol::request_models::AssessmentRequest;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use tokio_util::sync::CancellationToken;

/// Runs the same pipeline as `/stream` with progress discarded, bounded by
/// the configured timeout. A timed-out run is cancelled and its cleanup
/// still runs on the stage worker.
pub async fn assess(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Assessment>, ApiError> {
    let request: AssessmentRequest = serde_json::from_slice(&body)?;

    let cancel = CancellationToken::new();
    let mut emitter = EventEmitter::new(DiscardSink, cancel.clone());
    let run = state.engine.run(request, &mut emitter, cancel.clone());

    match tokio::time::timeout(state.assess_timeout, run).await {
        Ok(report) => {
            tracing::info!(run_id = %report.run_id, success = report.is_success(), "assessment finished");
            Ok(Json(report.outcome?))
        }
        Err(_) => {
            cancel.cancel();
            tracing::warn!(timeout = ?state.assess_timeout, "assessment timed out");
            Err(ApiError::Timeout(state.assess_timeout))
        }
    }
}
