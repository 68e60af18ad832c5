//! Wiring collaborators from service settings.

use crate::config::settings::{EvaluatorSettings, ServiceSettings};
use crate::evaluators::adapters::{
    CommandEvaluator, CommandMediaPreparer, JsonlResultStore, MockEvaluator,
};
use crate::evaluators::base::{CheckEvaluator, MediaPreparer, ResultStore};
use std::path::Path;
use std::sync::Arc;

/// The external collaborators one engine drives.
#[derive(Clone)]
pub struct Collaborators {
    pub evaluator: Arc<dyn CheckEvaluator>,
    pub media: Arc<dyn MediaPreparer>,
    pub store: Arc<dyn ResultStore>,
}

pub struct EvaluatorFactory;

impl EvaluatorFactory {
    /// Pick the evaluator for `settings`.
    ///
    /// - A configured command → `CommandEvaluator`
    /// - No command → `MockEvaluator`
    pub fn create(settings: &EvaluatorSettings) -> Arc<dyn CheckEvaluator> {
        match &settings.command {
            Some(command) => {
                let evaluator = CommandEvaluator::new(
                    command.clone(),
                    settings.args.clone(),
                    settings.max_parallel_groups,
                );
                if !evaluator.check_availability() {
                    tracing::warn!(command = %command, "evaluator command not found on PATH");
                }
                Arc::new(evaluator)
            }
            None => {
                tracing::warn!("no evaluator command configured; using the mock evaluator");
                Arc::new(MockEvaluator::success())
            }
        }
    }

    /// Build every collaborator. A relative storage root is resolved against
    /// `project_root`.
    pub fn collaborators(
        settings: &ServiceSettings,
        project_root: &Path,
    ) -> std::io::Result<Collaborators> {
        let storage_root = if settings.storage.root.is_absolute() {
            settings.storage.root.clone()
        } else {
            project_root.join(&settings.storage.root)
        };

        Ok(Collaborators {
            evaluator: Self::create(&settings.evaluator),
            media: Arc::new(CommandMediaPreparer::new(&settings.media)?),
            store: Arc::new(JsonlResultStore::new(storage_root)),
        })
    }
}
