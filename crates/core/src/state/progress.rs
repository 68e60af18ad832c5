//! Progress counters for one pipeline run.
//!
//! `completed` is an atomic counter advanced by the emitting task as stage
//! work is credited. `total` is fixed exactly once, before the first stage
//! runs. The current step label sits behind a lock because it is a string;
//! it is only written between stages.

use ak_protocol::stream_models::Progress;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, RwLock};
use thiserror::Error;

pub const INITIAL_STEP: &str = "initializing";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("total already fixed at {0}")]
    TotalAlreadyFixed(u64),

    #[error("progress advanced before the total was fixed")]
    TotalNotFixed,

    #[error("completed would exceed total: {completed} + {delta} > {total}")]
    Overflow { completed: u64, delta: u64, total: u64 },

    #[error("unknown work group reported: {0}")]
    UnknownGroup(String),

    #[error("work group reported twice: {0}")]
    DuplicateGroup(String),
}

#[derive(Debug)]
pub struct ProgressState {
    completed: AtomicU64,
    total: OnceLock<u64>,
    step: RwLock<String>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            completed: AtomicU64::new(0),
            total: OnceLock::new(),
            step: RwLock::new(INITIAL_STEP.to_string()),
        }
    }

    /// Fix the run's total. Fails if called a second time.
    pub fn fix_total(&self, total: u64) -> Result<(), ProgressError> {
        self.total
            .set(total)
            .map_err(|_| ProgressError::TotalAlreadyFixed(self.total().unwrap_or(total)))
    }

    pub fn total(&self) -> Option<u64> {
        self.total.get().copied()
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Credit `delta` units. `completed` never decreases and never passes
    /// `total`; a delta of zero is a no-op.
    pub fn advance(&self, delta: u64) -> Result<u64, ProgressError> {
        let total = self.total().ok_or(ProgressError::TotalNotFixed)?;
        let mut current = self.completed.load(Ordering::Acquire);
        loop {
            let next = current
                .checked_add(delta)
                .filter(|next| *next <= total)
                .ok_or(ProgressError::Overflow {
                    completed: current,
                    delta,
                    total,
                })?;
            match self.completed.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(next),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn set_step(&self, label: impl Into<String>) {
        let mut step = self.step.write().unwrap_or_else(|e| e.into_inner());
        *step = label.into();
    }

    pub fn step(&self) -> String {
        self.step.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Counters as they go on the wire. An unfixed total reads as zero.
    pub fn snapshot(&self) -> Progress {
        Progress::new(self.completed(), self.total().unwrap_or(0))
    }
}
