//! Pipeline execution engine.
//!
//! The [`AssessmentEngine`] validates a request, fixes the run's total from
//! the [`PipelinePlan`], and drives each planned stage through the
//! [`KeepaliveExecutor`] on a dedicated [`StageWorker`]. It emits exactly
//! one terminal event per run.

pub mod error;
pub mod keepalive;
pub mod plan;
pub mod stage;
pub mod worker;

pub use error::PipelineError;
pub use keepalive::{KeepaliveExecutor, RunState};
pub use plan::{PipelinePlan, PlannedStage, StageKind};
pub use stage::{Stage, StageContext, StageWork};
pub use worker::StageWorker;

use crate::config::assessment::AssessmentConfig;
use crate::config::settings::StreamSettings;
use crate::credentials::{CredentialScope, CredentialSource};
use crate::emitter::{EventEmitter, EventSink};
use crate::evaluators::{Collaborators, EvaluationRequest, MediaPreparer};
use crate::registry::CheckRegistry;
use crate::state::ProgressState;
use ak_protocol::assessment_models::Assessment;
use ak_protocol::check_models::{CheckCategory, CheckEvaluation};
use ak_protocol::request_models::AssessmentRequest;
use ak_protocol::stream_models::{Progress, StreamEvent};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Stream cadence and limits for every run of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub run_deadline: Option<Duration>,
    pub completion_buffer: usize,
}

impl EngineOptions {
    pub fn from_settings(settings: &StreamSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            heartbeat_interval: settings.heartbeat_interval(),
            run_deadline: settings.run_deadline(),
            completion_buffer: settings.completion_buffer,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_settings(&StreamSettings::default())
    }
}

/// What happened during one run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Counters at the moment the run ended.
    pub progress: Progress,
    pub outcome: Result<Assessment, PipelineError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct AssessmentEngine {
    registry: Arc<CheckRegistry>,
    collaborators: Collaborators,
    credentials: CredentialSource,
    options: EngineOptions,
}

impl AssessmentEngine {
    pub fn new(registry: Arc<CheckRegistry>, collaborators: Collaborators) -> Self {
        Self {
            registry,
            collaborators,
            credentials: CredentialSource::None,
            options: EngineOptions::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Validate `request` and compute its plan without running anything.
    pub fn plan(&self, request: AssessmentRequest) -> Result<PipelinePlan, PipelineError> {
        let config = AssessmentConfig::from_request(request)?;
        Ok(PipelinePlan::build(&config, &self.registry))
    }

    /// Execute one run, writing its events to `emitter`.
    ///
    /// Never fails: the outcome is in the report and has already been
    /// emitted as the terminal event, unless the client was gone.
    pub async fn run<S: EventSink>(
        &self,
        request: AssessmentRequest,
        emitter: &mut EventEmitter<S>,
        cancel: CancellationToken,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let progress = ProgressState::new();
        let span = tracing::info_span!("run", %run_id);

        let outcome = self
            .execute(run_id, request, emitter, &progress, cancel)
            .instrument(span.clone())
            .await;
        emit_terminal(&outcome, emitter).instrument(span).await;

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            progress: progress.snapshot(),
            outcome,
        }
    }

    async fn execute<S: EventSink>(
        &self,
        run_id: Uuid,
        request: AssessmentRequest,
        emitter: &mut EventEmitter<S>,
        progress: &ProgressState,
        cancel: CancellationToken,
    ) -> Result<Assessment, PipelineError> {
        let config = AssessmentConfig::from_request(request)?.with_run_id(run_id);
        for id in self.registry.unknown_ids(&config.check_filter) {
            tracing::warn!(check = id, "filter names an unknown check");
        }

        let plan = PipelinePlan::build(&config, &self.registry);
        progress.fix_total(plan.total())?;
        tracing::info!(
            media = %config.media_uri,
            total = plan.total(),
            stages = plan.len(),
            "pipeline planned"
        );

        let mut config = Arc::new(config);
        let worker = StageWorker::spawn(format!("ak-run-{}", run_id.simple()))
            .map_err(PipelineError::WorkerSpawn)?;
        let run_cancel = cancel.child_token();
        let mut resources = RunResources {
            worker,
            media: Arc::clone(&self.collaborators.media),
            config: Arc::clone(&config),
            credentials: None,
            cleaned: false,
            cancel: run_cancel.clone(),
        };
        let executor = KeepaliveExecutor::new(
            self.options.poll_interval,
            self.options.heartbeat_interval,
            self.options.completion_buffer,
        );
        let mut run = RunState {
            progress,
            emitter,
            cancel: run_cancel,
            deadline: self.options.run_deadline.map(|limit| Instant::now() + limit),
        };

        let mut evaluations: BTreeMap<CheckCategory, Vec<CheckEvaluation>> = BTreeMap::new();
        let mut assessment = Assessment::default();

        for planned in plan.into_stages() {
            let label = planned.label;
            let units = planned.units;
            let group_counts = planned.group_counts();

            run.progress.set_step(label);
            run.emitter.emit_progress(run.progress).await?;
            tracing::debug!(stage = label, units, "stage started");

            match planned.kind {
                StageKind::Credentials => {
                    let source = self.credentials.clone();
                    let stage = Stage::atomic(label, units, move |_| source.acquire());
                    resources.credentials = executor.execute(stage, &resources.worker, &mut run).await?;
                }
                StageKind::BuildConfig => {
                    let base = Arc::clone(&config);
                    let credentials_path = resources.credential_path();
                    let stage = Stage::atomic(label, units, move |_| {
                        Ok(Arc::new(base.as_ref().clone().with_credentials(credentials_path)))
                    });
                    config = executor.execute(stage, &resources.worker, &mut run).await?;
                    resources.config = Arc::clone(&config);
                }
                StageKind::Annotations => {
                    let media = Arc::clone(&self.collaborators.media);
                    let cfg = Arc::clone(&config);
                    let stage = Stage::atomic(label, units, move |_| media.generate_annotations(&cfg));
                    executor.execute(stage, &resources.worker, &mut run).await?;
                }
                StageKind::Trim => {
                    let media = Arc::clone(&self.collaborators.media);
                    let cfg = Arc::clone(&config);
                    let stage = Stage::atomic(label, units, move |_| media.trim(&cfg));
                    executor.execute(stage, &resources.worker, &mut run).await?;
                }
                StageKind::Evaluate { category, groups } => {
                    let evaluator = Arc::clone(&self.collaborators.evaluator);
                    let cfg = Arc::clone(&config);
                    let stage = Stage::fan_out(label, group_counts.unwrap_or_default(), move |ctx| {
                        let request = EvaluationRequest {
                            config: &cfg,
                            media_ref: &cfg.media_uri,
                            category,
                            groups: &groups,
                            cancel: ctx.cancel_token(),
                        };
                        evaluator.evaluate(&request, &|group_key: &str| ctx.report_group(group_key))
                    });
                    let found = executor.execute(stage, &resources.worker, &mut run).await?;
                    tracing::info!(%category, evaluated = found.len(), "category evaluated");
                    evaluations.insert(category, found);
                }
                StageKind::BuildAssessment => {
                    let cfg = Arc::clone(&config);
                    let parts = std::mem::take(&mut evaluations);
                    let stage = Stage::atomic(label, units, move |_| Ok(assemble(&cfg, parts)));
                    assessment = executor.execute(stage, &resources.worker, &mut run).await?;
                    if config.verbose {
                        log_assessment(&assessment);
                    }
                }
                StageKind::Store => {
                    let store = Arc::clone(&self.collaborators.store);
                    let cfg = Arc::clone(&config);
                    let built = std::mem::take(&mut assessment);
                    let stage = Stage::atomic(label, units, move |_| {
                        store.store(&cfg, &built)?;
                        Ok(built)
                    });
                    assessment = executor.execute(stage, &resources.worker, &mut run).await?;
                }
                StageKind::Cleanup => {
                    let media = Arc::clone(&self.collaborators.media);
                    let cfg = Arc::clone(&config);
                    let stage = Stage::atomic(label, units, move |_| media.remove_local_files(&cfg));
                    executor.execute(stage, &resources.worker, &mut run).await?;
                    resources.finish_cleanup();
                }
            }
        }

        Ok(assessment)
    }
}

/// Per-run resources released on every exit path.
///
/// On early exit the media cleanup and the credential release are queued
/// behind whatever the worker is still running, then the worker is shut
/// down without waiting.
struct RunResources {
    worker: StageWorker,
    media: Arc<dyn MediaPreparer>,
    config: Arc<AssessmentConfig>,
    credentials: Option<CredentialScope>,
    cleaned: bool,
    cancel: CancellationToken,
}

impl RunResources {
    fn credential_path(&self) -> Option<PathBuf> {
        self.credentials
            .as_ref()
            .map(|scope| scope.path().to_path_buf())
    }

    fn finish_cleanup(&mut self) {
        self.cleaned = true;
        self.credentials = None;
    }
}

impl Drop for RunResources {
    fn drop(&mut self) {
        self.cancel.cancel();
        if !self.cleaned {
            let media = Arc::clone(&self.media);
            let config = Arc::clone(&self.config);
            let credentials = self.credentials.take();
            let queued = self.worker.submit_detached(move || {
                if let Err(error) = media.remove_local_files(&config) {
                    tracing::warn!(error = %format!("{error:#}"), "cleanup after failed run");
                }
                drop(credentials);
            });
            if queued.is_err() {
                tracing::warn!("cleanup could not be queued on the stage worker");
            }
        }
        self.worker.shutdown();
    }
}

async fn emit_terminal<S: EventSink>(
    outcome: &Result<Assessment, PipelineError>,
    emitter: &mut EventEmitter<S>,
) {
    let terminal = match outcome {
        Ok(assessment) => {
            tracing::info!(evaluated = assessment.evaluated_count(), "run complete");
            StreamEvent::Complete {
                result: assessment.clone(),
            }
        }
        Err(error) => {
            if error.is_validation() {
                tracing::warn!(%error, "request rejected");
            } else {
                tracing::error!(%error, "run failed");
            }
            StreamEvent::error(error)
        }
    };
    if let Err(error) = emitter.emit(&terminal).await {
        tracing::debug!(%error, "terminal event not delivered");
    }
}

fn assemble(
    config: &AssessmentConfig,
    evaluations: BTreeMap<CheckCategory, Vec<CheckEvaluation>>,
) -> Assessment {
    let mut assessment = Assessment {
        brand_name: config.brand.name.clone(),
        video_uri: config.media_uri.clone(),
        ..Assessment::default()
    };
    for (category, found) in evaluations {
        assessment.set_evaluations(category, found);
    }
    assessment
}

fn log_assessment(assessment: &Assessment) {
    for category in CheckCategory::ALL {
        for evaluation in assessment.evaluations(category) {
            tracing::info!(
                %category,
                feature = %evaluation.feature_id,
                detected = evaluation.detected,
                confidence = evaluation.confidence_score,
                "feature evaluated"
            );
        }
    }
}
