//! NDJSON event emission.
//!
//! The [`EventEmitter`] owns the output channel for one run. It writes one
//! line per event in call order, refuses anything after a terminal event and
//! stops writing for good once the reader has gone away.

pub mod sinks;

pub use sinks::{ChannelSink, DiscardSink, EventSink, WriterSink};

use crate::state::ProgressState;
use ak_protocol::stream_models::StreamEvent;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("event emitted after the terminal event")]
    AfterTerminal,

    #[error("client disconnected")]
    Disconnected,

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    Open,
    Terminated,
    Disconnected,
}

pub struct EventEmitter<S> {
    sink: S,
    state: EmitterState,
    last_emit: Instant,
    emitted: u64,
    cancel: CancellationToken,
}

impl<S: EventSink> EventEmitter<S> {
    /// `cancel` is triggered when the sink reports that the reader is gone.
    pub fn new(sink: S, cancel: CancellationToken) -> Self {
        Self {
            sink,
            state: EmitterState::Open,
            last_emit: Instant::now(),
            emitted: 0,
            cancel,
        }
    }

    pub async fn emit(&mut self, event: &StreamEvent) -> Result<(), EmitError> {
        match self.state {
            EmitterState::Terminated => return Err(EmitError::AfterTerminal),
            EmitterState::Disconnected => return Err(EmitError::Disconnected),
            EmitterState::Open => {}
        }

        let line = event.to_ndjson_line()?;
        if let Err(e) = self.sink.write_line(line).await {
            tracing::warn!(error = %e, "event sink closed; cancelling run");
            self.state = EmitterState::Disconnected;
            self.cancel.cancel();
            return Err(EmitError::Disconnected);
        }

        self.emitted += 1;
        self.last_emit = Instant::now();
        if event.is_terminal() {
            self.state = EmitterState::Terminated;
        }
        Ok(())
    }

    /// Emit a `processing` event from the current counters.
    pub async fn emit_progress(&mut self, progress: &ProgressState) -> Result<(), EmitError> {
        let event = StreamEvent::processing(progress.step(), progress.snapshot());
        self.emit(&event).await
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == EmitterState::Open
    }

    /// When the last event was written; starts at construction.
    pub fn last_emit(&self) -> Instant {
        self.last_emit
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
