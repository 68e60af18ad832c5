//! Collaborator traits the pipeline drives.
//!
//! Every method is blocking and only ever called on the run's stage worker.
//! Implementations may take as long as they need; the keepalive executor
//! keeps the stream alive meanwhile.

use crate::config::assessment::AssessmentConfig;
use crate::registry::CheckGroups;
use ak_protocol::assessment_models::Assessment;
use ak_protocol::check_models::{CheckCategory, CheckEvaluation};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Input to one evaluation stage.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    pub config: &'a AssessmentConfig,
    /// Locator of the media under evaluation.
    pub media_ref: &'a str,
    pub category: CheckCategory,
    /// Exactly the groups the run's total was computed from.
    pub groups: &'a CheckGroups,
    pub cancel: &'a CancellationToken,
}

/// Evaluates checks against media.
pub trait CheckEvaluator: Send + Sync {
    fn name(&self) -> &str;

    fn check_availability(&self) -> bool {
        true
    }

    /// Evaluate every check in `request.groups`, calling `on_group_complete`
    /// with the group key once each group is done.
    fn evaluate(
        &self,
        request: &EvaluationRequest<'_>,
        on_group_complete: &(dyn Fn(&str) + Sync),
    ) -> anyhow::Result<Vec<CheckEvaluation>>;
}

/// Prepares media before evaluation and removes local artefacts afterwards.
pub trait MediaPreparer: Send + Sync {
    fn generate_annotations(&self, config: &AssessmentConfig) -> anyhow::Result<()>;

    fn trim(&self, config: &AssessmentConfig) -> anyhow::Result<()>;

    /// Also called on failed runs, so it must tolerate partial preparation.
    fn remove_local_files(&self, config: &AssessmentConfig) -> anyhow::Result<()>;
}

/// Persists a finished assessment.
pub trait ResultStore: Send + Sync {
    fn store(&self, config: &AssessmentConfig, assessment: &Assessment) -> anyhow::Result<()>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    #[error("Evaluator not available: {0}")]
    NotAvailable(String),

    #[error("Evaluation failed: {0}")]
    ExecutionError(String),

    #[error("Evaluator output parsing error: {0}")]
    OutputParseError(String),

    #[error("Evaluation cancelled")]
    Cancelled,
}
