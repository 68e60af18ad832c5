//! Collaborators behind the pipeline stages.
//!
//! This module provides the blocking collaborator traits (Adapter Pattern),
//! their implementations and the factory that wires them from settings.

pub mod adapters;
pub mod base;
pub mod command_runner;
pub mod factory;

pub use adapters::{CommandEvaluator, CommandMediaPreparer, JsonlResultStore, MockEvaluator};
pub use base::{CheckEvaluator, EvaluationRequest, EvaluatorError, MediaPreparer, ResultStore};
pub use factory::{Collaborators, EvaluatorFactory};
