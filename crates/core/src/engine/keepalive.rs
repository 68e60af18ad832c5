//! Keepalive execution of a single stage.
//!
//! The stage body runs on the run's [`StageWorker`]. The calling task waits
//! on the result in slices of `poll_interval`; between slices it credits
//! any groups reported through the completion channel and emits a
//! `processing` event when something changed or when the stream has been
//! silent for `heartbeat_interval`. A poll slice expiring never affects the
//! running body.

use crate::emitter::{EventEmitter, EventSink};
use crate::engine::error::PipelineError;
use crate::engine::stage::{Stage, StageContext, StageWork};
use crate::engine::worker::{panic_message, StageWorker};
use crate::state::{completion_channel, CompletionReceiver, ProgressState, StageLedger};
use std::future::pending;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Per-run state the executor reads and advances.
pub struct RunState<'a, S> {
    pub progress: &'a ProgressState,
    pub emitter: &'a mut EventEmitter<S>,
    pub cancel: CancellationToken,
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveExecutor {
    poll_interval: Duration,
    heartbeat_interval: Duration,
    completion_buffer: usize,
}

impl KeepaliveExecutor {
    pub fn new(poll_interval: Duration, heartbeat_interval: Duration, completion_buffer: usize) -> Self {
        Self {
            poll_interval,
            heartbeat_interval,
            completion_buffer,
        }
    }

    /// Run `stage` to completion and return its value.
    ///
    /// On success every declared unit of the stage has been credited. A
    /// failing body returns at once without further events.
    pub async fn execute<T, S>(
        &self,
        stage: Stage<T>,
        worker: &StageWorker,
        run: &mut RunState<'_, S>,
    ) -> Result<T, PipelineError>
    where
        T: Send + 'static,
        S: EventSink,
    {
        let (name, declared_units, work, body) = stage.into_parts();

        if run.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if run.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            run.cancel.cancel();
            return Err(PipelineError::DeadlineExceeded);
        }

        let (context, receiver, mut ledger) = match work {
            StageWork::Atomic => (StageContext::new(None, run.cancel.clone()), None, None),
            StageWork::FanOut(groups) => {
                let (tx, rx) = completion_channel(self.completion_buffer);
                (
                    StageContext::new(Some(tx), run.cancel.clone()),
                    Some(rx),
                    Some(StageLedger::new(groups)),
                )
            }
        };

        let mut handle = worker
            .submit(move || body(&context))
            .map_err(|_| PipelineError::WorkerLost {
                stage: name.clone(),
            })?;

        let mut polls = 0u64;
        let mut heartbeats = 0u64;

        let joined = loop {
            tokio::select! {
                biased;
                joined = &mut handle => break joined,
                _ = run.cancel.cancelled() => {
                    tracing::debug!(stage = %name, "stage abandoned after cancellation");
                    return Err(PipelineError::Cancelled);
                }
                _ = deadline_reached(run.deadline) => {
                    run.cancel.cancel();
                    return Err(PipelineError::DeadlineExceeded);
                }
                _ = sleep(self.poll_interval) => {}
            }

            polls += 1;
            let drained = drain(receiver.as_ref(), ledger.as_mut(), run.progress)?;
            let silent_for = run.emitter.last_emit().elapsed();
            if drained > 0 || silent_for >= self.heartbeat_interval {
                if drained == 0 {
                    heartbeats += 1;
                }
                run.emitter.emit_progress(run.progress).await?;
            }
        };

        let value = match joined {
            Err(_) => return Err(PipelineError::WorkerLost { stage: name }),
            Ok(Err(payload)) => {
                return Err(PipelineError::StagePanicked {
                    message: panic_message(payload.as_ref()),
                    stage: name,
                })
            }
            Ok(Ok(Err(error))) => return Err(PipelineError::Stage { stage: name, error }),
            Ok(Ok(Ok(value))) => value,
        };

        let mut pending_units = drain(receiver.as_ref(), ledger.as_mut(), run.progress)?;
        let settled = match ledger.as_mut() {
            Some(ledger) => ledger.settle(),
            None => declared_units,
        };
        if settled > 0 {
            run.progress.advance(settled)?;
            pending_units += settled;
        }
        if pending_units > 0 {
            run.emitter.emit_progress(run.progress).await?;
        }

        tracing::debug!(stage = %name, polls, heartbeats, credited = pending_units, "stage finished");
        Ok(value)
    }
}

/// Credit every buffered group report; returns the units credited.
fn drain(
    receiver: Option<&CompletionReceiver>,
    ledger: Option<&mut StageLedger>,
    progress: &ProgressState,
) -> Result<u64, PipelineError> {
    let (Some(receiver), Some(ledger)) = (receiver, ledger) else {
        return Ok(0);
    };
    let mut units = 0;
    for key in receiver.drain() {
        units += ledger.credit(&key)?;
    }
    if units > 0 {
        progress.advance(units)?;
    }
    Ok(units)
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
