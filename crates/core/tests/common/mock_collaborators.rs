//! Collaborators that record how the pipeline drove them.

use ak_core::config::assessment::AssessmentConfig;
use ak_core::evaluators::{
    CheckEvaluator, Collaborators, MediaPreparer, MockEvaluator, ResultStore,
};
use ak_protocol::assessment_models::Assessment;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared, ordered log of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    /// Poll until `call` shows up. Cleanup after a failure runs detached.
    pub fn wait_for(&self, call: &str, timeout: Duration) -> bool {
        let started = Instant::now();
        while started.elapsed() < timeout {
            if self.contains(call) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingMedia {
    pub log: CallLog,
    pub fail_trim: bool,
    /// Run id of every config handed to `trim`.
    pub trimmed_runs: CallLog,
}

impl MediaPreparer for RecordingMedia {
    fn generate_annotations(&self, config: &AssessmentConfig) -> anyhow::Result<()> {
        self.log.record(format!("annotate {}", config.media_uri));
        Ok(())
    }

    fn trim(&self, config: &AssessmentConfig) -> anyhow::Result<()> {
        self.log.record(format!("trim {}", config.media_uri));
        self.trimmed_runs.record(config.run_id.to_string());
        anyhow::ensure!(!self.fail_trim, "ffmpeg exited with status 1");
        Ok(())
    }

    fn remove_local_files(&self, _config: &AssessmentConfig) -> anyhow::Result<()> {
        self.log.record("cleanup");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    pub stored: Arc<Mutex<Vec<(String, Assessment)>>>,
}

impl RecordingStore {
    pub fn stored(&self) -> Vec<(String, Assessment)> {
        self.stored.lock().unwrap().clone()
    }
}

impl ResultStore for RecordingStore {
    fn store(&self, config: &AssessmentConfig, assessment: &Assessment) -> anyhow::Result<()> {
        self.stored
            .lock()
            .unwrap()
            .push((config.storage.table.clone(), assessment.clone()));
        Ok(())
    }
}

/// Handles onto the recording collaborators behind one engine.
pub struct Recorders {
    pub media: RecordingMedia,
    pub store: RecordingStore,
}

impl Recorders {
    pub fn calls(&self) -> Vec<String> {
        self.media.log.calls()
    }
}

pub fn recording_collaborators(evaluator: MockEvaluator) -> (Collaborators, Recorders) {
    with_media(evaluator, RecordingMedia::default())
}

pub fn with_media(evaluator: MockEvaluator, media: RecordingMedia) -> (Collaborators, Recorders) {
    let store = RecordingStore::default();
    let evaluator: Arc<dyn CheckEvaluator> = Arc::new(evaluator);
    let collaborators = Collaborators {
        evaluator,
        media: Arc::new(media.clone()),
        store: Arc::new(store.clone()),
    };
    (collaborators, Recorders { media, store })
}
