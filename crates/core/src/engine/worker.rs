//! The dedicated execution context for a run's blocking stage bodies.
//!
//! Each run gets one OS thread with a FIFO job queue. Stages are submitted
//! one at a time, so no two stages of a run overlap. Shutting the worker
//! down closes the queue without joining: a job already running finishes on
//! its own and anything queued behind it still runs, unobserved.
//!
//! Not `spawn_blocking`: cleanup queued after an abandoned stage must run
//! strictly after that stage's body, on the same thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;
use tokio::sync::oneshot;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("stage worker is no longer accepting work")]
pub struct WorkerClosed;

/// Result of one submitted job. `Err` carries the panic payload.
pub type JobHandle<T> = oneshot::Receiver<thread::Result<T>>;

#[derive(Debug)]
pub struct StageWorker {
    name: String,
    jobs: Option<mpsc::Sender<Job>>,
}

impl StageWorker {
    pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
        let name = name.into();
        let (tx, rx) = mpsc::channel::<Job>();
        thread::Builder::new().name(name.clone()).spawn(move || {
            while let Ok(job) = rx.recv() {
                job();
            }
        })?;
        tracing::debug!(worker = %name, "stage worker started");
        Ok(Self {
            name,
            jobs: Some(tx),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `job` and return a handle to its result.
    ///
    /// Dropping the handle does not stop the job.
    pub fn submit<T, F>(&self, job: F) -> Result<JobHandle<T>, WorkerClosed>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(WorkerClosed)?;
        let (tx, rx) = oneshot::channel();
        let wrapped: Job = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(job));
            let _ = tx.send(result);
        });
        jobs.send(wrapped).map_err(|_| WorkerClosed)?;
        Ok(rx)
    }

    /// Queue a job nobody waits for.
    pub fn submit_detached<F>(&self, job: F) -> Result<(), WorkerClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(job).map(drop)
    }

    /// Close the queue. Does not wait for queued or running jobs.
    pub fn shutdown(&mut self) {
        if self.jobs.take().is_some() {
            tracing::debug!(worker = %self.name, "stage worker shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.jobs.is_none()
    }
}

impl Drop for StageWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Human-readable text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
