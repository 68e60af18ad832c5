//! Run state shared between the stage worker and the emitting task.
//!
//! This module provides:
//! - [`ProgressState`]: lock-free progress counters for one run
//! - The bounded completion channel fan-out stages report through

pub mod completion;
pub mod progress;

pub use completion::{completion_channel, CompletionReceiver, CompletionSender, StageLedger};
pub use progress::{ProgressError, ProgressState};
