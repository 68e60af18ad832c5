//! Completion channel for fan-out stages.
//!
//! Evaluators running on the stage worker push the key of every finished
//! group onto a bounded channel. The executor drains it between polls and
//! converts keys into work units through a [`StageLedger`], which holds the
//! item counts captured when the plan was built.

use crate::state::progress::ProgressError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

/// Producer half, cloned into every thread that finishes groups.
#[derive(Debug, Clone)]
pub struct CompletionSender {
    tx: SyncSender<String>,
}

impl CompletionSender {
    /// Report a finished group. Blocks while the channel is full. Reports
    /// made after the stage has been abandoned are dropped.
    pub fn report(&self, group_key: &str) {
        if self.tx.send(group_key.to_string()).is_err() {
            tracing::debug!(group = group_key, "completion report after stage ended");
        }
    }
}

#[derive(Debug)]
pub struct CompletionReceiver {
    rx: Receiver<String>,
}

impl CompletionReceiver {
    /// Take every report currently buffered without waiting.
    pub fn drain(&self) -> Vec<String> {
        let mut keys = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(key) => keys.push(key),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return keys,
            }
        }
    }
}

/// Bounded channel with room for `capacity` unread reports.
pub fn completion_channel(capacity: usize) -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    (CompletionSender { tx }, CompletionReceiver { rx })
}

/// Tracks which of a stage's planned groups have been credited.
#[derive(Debug, Clone, Default)]
pub struct StageLedger {
    expected: BTreeMap<String, u64>,
    credited: BTreeSet<String>,
}

impl StageLedger {
    pub fn new(expected: BTreeMap<String, u64>) -> Self {
        Self {
            expected,
            credited: BTreeSet::new(),
        }
    }

    /// Units represented by `group_key`. A key outside the plan, or one
    /// already credited, is a protocol error.
    pub fn credit(&mut self, group_key: &str) -> Result<u64, ProgressError> {
        let units = *self
            .expected
            .get(group_key)
            .ok_or_else(|| ProgressError::UnknownGroup(group_key.to_string()))?;
        if !self.credited.insert(group_key.to_string()) {
            return Err(ProgressError::DuplicateGroup(group_key.to_string()));
        }
        Ok(units)
    }

    /// Units of groups not reported yet. Marks them all as credited.
    pub fn settle(&mut self) -> u64 {
        let mut remaining = 0;
        for (key, units) in &self.expected {
            if self.credited.insert(key.clone()) {
                remaining += units;
            }
        }
        remaining
    }

    pub fn planned_units(&self) -> u64 {
        self.expected.values().sum()
    }
}
