//! `POST /stream`: NDJSON progress for one assessment.

use crate::AppState;
use ak_core::emitter::{ChannelSink, EventEmitter};
use ak_protocol::request_models::AssessmentRequest;
use ak_protocol::stream_models::StreamEvent;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

pub const NDJSON: &str = "application/x-ndjson";

/// Start the run in the background and stream its events as they are
/// emitted.
///
/// The response is always `200`; failures arrive as the `error` record.
/// When the client goes away the response body is dropped, the emitter's
/// next write fails and the run is cancelled.
pub async fn stream(State(state): State<AppState>, body: Bytes) -> Response {
    let (tx, rx) = mpsc::channel(state.stream_buffer.max(1));
    let cancel = CancellationToken::new();
    let mut emitter = EventEmitter::new(ChannelSink::new(tx), cancel.clone());

    match serde_json::from_slice::<AssessmentRequest>(&body) {
        Ok(request) => {
            let engine = Arc::clone(&state.engine);
            tokio::spawn(async move {
                let report = engine.run(request, &mut emitter, cancel).await;
                tracing::info!(
                    run_id = %report.run_id,
                    success = report.is_success(),
                    events = emitter.emitted(),
                    "stream finished"
                );
            });
        }
        Err(error) => {
            tracing::warn!(%error, "undecodable stream request");
            let event = StreamEvent::error(format!("Invalid request body: {error}"));
            if let Err(error) = emitter.emit(&event).await {
                tracing::debug!(%error, "decode error not delivered");
            }
        }
    }

    ndjson_response(rx)
}

fn ndjson_response(rx: mpsc::Receiver<String>) -> Response {
    let lines = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    (
        [(CONTENT_TYPE, NDJSON), (CACHE_CONTROL, "no-cache")],
        Body::from_stream(lines),
    )
        .into_response()
}
