//! # ak-server
//!
//! HTTP surface for assess-kit.
//!
//! - `POST /stream`: runs an assessment and streams its NDJSON progress
//! - `POST /assess`: runs an assessment and returns the result once done
//! - `GET /health`: liveness, no authentication
//!
//! Both assessment endpoints require `Authorization: Bearer <token>`.

use ak_core::engine::AssessmentEngine;
use axum::routing::post;
use axum::{middleware, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod routes;

/// Lines buffered between a run and a slow HTTP client before the run
/// waits on the client.
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AssessmentEngine>,
    /// Expected bearer token.
    pub auth_token: Arc<str>,
    /// Ceiling for `POST /assess`.
    pub assess_timeout: Duration,
    pub stream_buffer: usize,
}

impl AppState {
    pub fn new(engine: Arc<AssessmentEngine>, auth_token: impl Into<Arc<str>>) -> Self {
        Self {
            engine,
            auth_token: auth_token.into(),
            assess_timeout: Duration::from_secs(600),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    pub fn with_assess_timeout(mut self, timeout: Duration) -> Self {
        self.assess_timeout = timeout;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/stream", post(routes::stream::stream))
        .route("/assess", post(routes::assess::assess))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .merge(protected)
        .merge(routes::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
