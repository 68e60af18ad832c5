//! Pipeline stages.

use crate::state::CompletionSender;
use std::collections::BTreeMap;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// The blocking operation a stage wraps.
pub type StageBody<T> = Box<dyn FnOnce(&StageContext) -> anyhow::Result<T> + Send + 'static>;

/// How a stage's declared units are credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageWork {
    /// All units are credited when the body returns.
    Atomic,
    /// Units are credited per group as the body reports them. Keys map to
    /// the item count captured for that group when the plan was built.
    FanOut(BTreeMap<String, u64>),
}

/// Handed to a stage body on the worker thread.
#[derive(Debug, Clone)]
pub struct StageContext {
    completions: Option<CompletionSender>,
    cancel: CancellationToken,
}

impl StageContext {
    pub(crate) fn new(completions: Option<CompletionSender>, cancel: CancellationToken) -> Self {
        Self {
            completions,
            cancel,
        }
    }

    /// Report that `group_key` has finished. A no-op for atomic stages.
    pub fn report_group(&self, group_key: &str) {
        if let Some(completions) = &self.completions {
            completions.report(group_key);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

pub struct Stage<T> {
    name: String,
    declared_units: u64,
    work: StageWork,
    body: StageBody<T>,
}

impl<T> Stage<T> {
    pub fn atomic<F>(name: impl Into<String>, declared_units: u64, body: F) -> Self
    where
        F: FnOnce(&StageContext) -> anyhow::Result<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            declared_units,
            work: StageWork::Atomic,
            body: Box::new(body),
        }
    }

    /// A stage whose units are the sum of `groups`.
    pub fn fan_out<F>(name: impl Into<String>, groups: BTreeMap<String, u64>, body: F) -> Self
    where
        F: FnOnce(&StageContext) -> anyhow::Result<T> + Send + 'static,
    {
        Self {
            name: name.into(),
            declared_units: groups.values().sum(),
            work: StageWork::FanOut(groups),
            body: Box::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_units(&self) -> u64 {
        self.declared_units
    }

    pub fn work(&self) -> &StageWork {
        &self.work
    }

    pub(crate) fn into_parts(self) -> (String, u64, StageWork, StageBody<T>) {
        (self.name, self.declared_units, self.work, self.body)
    }
}

impl<T> fmt::Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("declared_units", &self.declared_units)
            .field("work", &self.work)
            .finish_non_exhaustive()
    }
}
