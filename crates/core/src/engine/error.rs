use crate::config::error::ConfigError;
use crate::emitter::EmitError;
use crate::state::ProgressError;
use thiserror::Error;

/// Everything that can end a run without a result.
///
/// The `Display` text is what clients see in the `error` event.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The request was rejected before any stage ran.
    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("{stage} failed: {error:#}")]
    Stage { stage: String, error: anyhow::Error },

    #[error("{stage} panicked: {message}")]
    StagePanicked { stage: String, message: String },

    #[error("stage worker was lost during {stage}")]
    WorkerLost { stage: String },

    #[error("failed to start stage worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("run was cancelled")]
    Cancelled,

    #[error("run exceeded its deadline")]
    DeadlineExceeded,

    #[error("progress accounting failed: {0}")]
    Protocol(#[from] ProgressError),

    #[error("failed to emit event: {0}")]
    Emit(#[from] EmitError),
}

impl PipelineError {
    /// Rejected input, as opposed to a failure while running.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Invalid(error) if error.is_validation())
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Emit(EmitError::Disconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_includes_cause_chain() {
        let error = PipelineError::Stage {
            stage: "Trimming video".to_string(),
            error: anyhow::anyhow!("ffmpeg exited with 1").context("trim failed"),
        };
        assert_eq!(
            error.to_string(),
            "Trimming video failed: trim failed: ffmpeg exited with 1"
        );
        assert!(!error.is_validation());
    }

    #[test]
    fn test_validation_classification() {
        let error = PipelineError::from(ConfigError::MissingField("gcs_uri"));
        assert!(error.is_validation());
        assert!(PipelineError::from(EmitError::Disconnected).is_disconnect());
    }
}
