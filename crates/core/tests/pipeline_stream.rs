//! Integration tests for the assessment pipeline and its progress stream.
//!
//! Each test drives a full run through `AssessmentEngine::run` and inspects
//! the NDJSON lines the emitter produced:
//! - Progress totals are fixed up front and reached exactly on success
//! - Progress is monotonic and each run ends with one terminal event
//! - Heartbeats keep a slow stage visible
//! - Failures, deadlines and disconnects end the run cleanly

mod common;

use ak_core::emitter::{ChannelSink, EventEmitter, WriterSink};
use ak_core::engine::{AssessmentEngine, EngineOptions, PipelineError, RunReport};
use ak_core::evaluators::MockEvaluator;
use ak_protocol::check_models::CheckCategory;
use ak_protocol::request_models::AssessmentRequest;
use ak_protocol::stream_models::{Progress, StreamEvent};
use common::*;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

async fn run_collecting(
    engine: &AssessmentEngine,
    request: AssessmentRequest,
) -> (RunReport, Vec<StreamEvent>) {
    let cancel = CancellationToken::new();
    let mut emitter = EventEmitter::new(WriterSink::new(Vec::new()), cancel.clone());
    let report = engine.run(request, &mut emitter, cancel).await;
    let events = parse_events(&emitter.into_sink().into_inner());
    (report, events)
}

fn engine(evaluator: MockEvaluator) -> (AssessmentEngine, Recorders) {
    engine_with(evaluator, fast_options())
}

fn engine_with(evaluator: MockEvaluator, options: EngineOptions) -> (AssessmentEngine, Recorders) {
    let (collaborators, recorders) = recording_collaborators(evaluator);
    let engine = AssessmentEngine::new(sample_registry(), collaborators).with_options(options);
    (engine, recorders)
}

#[tokio::test]
async fn test_successful_run_reaches_declared_total() {
    let (engine, recorders) = engine(MockEvaluator::success());

    let (report, events) = run_collecting(&engine, sample_request()).await;

    assert!(report.is_success(), "run failed: {:?}", report.outcome);
    assert_eq!(report.progress, Progress::new(SAMPLE_TOTAL, SAMPLE_TOTAL));

    let steps = processing(&events);
    assert_eq!(
        steps.first(),
        Some(&("Setting up credentials".to_string(), Progress::new(0, SAMPLE_TOTAL)))
    );
    assert_eq!(
        steps.last().map(|(_, progress)| *progress),
        Some(Progress::new(SAMPLE_TOTAL, SAMPLE_TOTAL))
    );
    assert_monotonic(&events, SAMPLE_TOTAL);

    let StreamEvent::Complete { result } = assert_single_terminal(&events) else {
        panic!("expected a complete event");
    };
    assert_eq!(result.brand_name, "Acme");
    assert_eq!(result.video_uri, MEDIA_URI);
    assert_eq!(result.evaluations(CheckCategory::LongFormAbcd).len(), 3);
    assert_eq!(result.evaluations(CheckCategory::Shorts).len(), 2);
    assert_eq!(result.evaluations(CheckCategory::Custom).len(), 1);

    assert_eq!(
        recorders.calls(),
        vec![format!("trim {MEDIA_URI}"), "cleanup".to_string()]
    );
    assert!(recorders.store.stored().is_empty());
}

#[tokio::test]
async fn test_stages_are_announced_in_plan_order() {
    let (engine, _recorders) = engine(MockEvaluator::success());
    let labels = engine.plan(sample_request()).unwrap().labels();

    let (_, events) = run_collecting(&engine, sample_request()).await;

    assert_eq!(
        labels,
        vec![
            "Setting up credentials",
            "Building configuration",
            "Trimming video",
            "Evaluating long-form ABCD features",
            "Evaluating Shorts features",
            "Evaluating Custom features",
            "Building assessment",
            "Cleaning up",
        ]
    );
    assert_eq!(announced_steps(&events), labels);
}

#[tokio::test]
async fn test_fan_out_credits_each_group_as_it_finishes() {
    let (engine, _recorders) = engine(MockEvaluator::success().with_delay(Duration::from_millis(40)));

    let (report, events) = run_collecting(&engine, sample_request()).await;
    assert!(report.is_success());

    // Long-form starts at 3/11 (credentials, config, trim) and has groups
    // `full` (2) and `opening` (1).
    let long_form: Vec<u64> = processing(&events)
        .into_iter()
        .filter(|(step, _)| step == "Evaluating long-form ABCD features")
        .map(|(_, progress)| progress.completed)
        .collect();
    assert_eq!(long_form.first(), Some(&3));
    assert!(long_form.contains(&5), "no update after the first group: {long_form:?}");
    assert_eq!(long_form.last(), Some(&6));
}

#[tokio::test]
async fn test_unreported_groups_settle_when_stage_returns() {
    let (engine, _recorders) = engine(MockEvaluator::success().without_reports());

    let (report, events) = run_collecting(&engine, sample_request()).await;

    assert!(report.is_success());
    assert_eq!(report.progress, Progress::new(SAMPLE_TOTAL, SAMPLE_TOTAL));
    assert_monotonic(&events, SAMPLE_TOTAL);
}

#[tokio::test]
async fn test_provider_mismatch_emits_only_an_error() {
    let (engine, recorders) = engine(MockEvaluator::success());
    let mut request = sample_request();
    request.creative_provider_type = "YOUTUBE".to_string();

    let (report, events) = run_collecting(&engine, request).await;

    assert_eq!(events.len(), 1);
    assert!(processing(&events).is_empty());
    let message = error_message(&events[0]);
    assert!(message.contains("YOUTUBE"), "unexpected message: {message}");
    assert!(message.contains(MEDIA_URI));

    let error = report.outcome.unwrap_err();
    assert!(error.is_validation());
    assert!(recorders.calls().is_empty(), "no stage may run for a rejected request");
}

#[tokio::test]
async fn test_unknown_provider_is_rejected() {
    let (engine, _recorders) = engine(MockEvaluator::success());
    let mut request = sample_request();
    request.creative_provider_type = "VIMEO".to_string();

    let (report, events) = run_collecting(&engine, request).await;

    assert_eq!(events.len(), 1);
    assert!(error_message(&events[0]).contains("VIMEO"));
    assert!(report.outcome.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_youtube_media_skips_preparation() {
    let (engine, recorders) = engine(MockEvaluator::success());
    let mut request = youtube_request();
    request.use_annotations = true;

    let (report, events) = run_collecting(&engine, request).await;

    assert!(report.is_success());
    // No annotations and no trim for YouTube media.
    assert_eq!(report.progress.total, SAMPLE_TOTAL - 1);
    assert!(!announced_steps(&events).iter().any(|step| step == "Trimming video"));
    assert_eq!(recorders.calls(), vec!["cleanup".to_string()]);
}

#[tokio::test]
async fn test_optional_stages_add_their_units() {
    let (engine, recorders) = engine(MockEvaluator::success());
    let mut request = sample_request();
    request.use_annotations = true;
    request.bq_dataset_name = "ads".to_string();
    request.bq_table_name = "assessments".to_string();

    let (report, events) = run_collecting(&engine, request).await;

    assert!(report.is_success());
    assert_eq!(report.progress, Progress::new(SAMPLE_TOTAL + 2, SAMPLE_TOTAL + 2));
    assert_monotonic(&events, SAMPLE_TOTAL + 2);

    let steps = announced_steps(&events);
    assert!(steps.iter().any(|step| step == "Generating video annotations"));
    assert!(steps.iter().any(|step| step == "Storing results in BigQuery"));

    let stored = recorders.store.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, "assessments");
    assert_eq!(stored[0].1.evaluated_count(), 6);
    assert_eq!(recorders.calls()[0], format!("annotate {MEDIA_URI}"));
}

#[tokio::test]
async fn test_disabled_categories_are_not_planned() {
    let (engine, _recorders) = engine(MockEvaluator::success());
    let mut request = sample_request();
    request.run_long_form_abcd = false;
    request.run_custom = false;

    let (report, events) = run_collecting(&engine, request).await;

    // credentials, config, shorts (2), build, cleanup
    assert_eq!(report.progress, Progress::new(6, 6));
    let steps = announced_steps(&events);
    assert!(!steps.iter().any(|step| step == "Trimming video"));
    assert!(!steps.iter().any(|step| step == "Evaluating Custom features"));
}

#[tokio::test]
async fn test_single_check_filter() {
    let (engine, _recorders) = engine(MockEvaluator::success());
    let mut request = sample_request();
    request.features_to_evaluate = "sh_quality".to_string();

    let (report, events) = run_collecting(&engine, request).await;

    // credentials, config, trim, 0 + 1 + 0 evaluation units, build, cleanup
    assert_eq!(report.progress, Progress::new(6, 6));
    assert_monotonic(&events, 6);

    let StreamEvent::Complete { result } = assert_single_terminal(&events) else {
        panic!("expected a complete event");
    };
    assert_eq!(result.evaluated_count(), 1);
    assert_eq!(result.evaluations(CheckCategory::Shorts)[0].feature_id, "sh_quality");
}

#[tokio::test]
async fn test_filter_with_only_unknown_ids_still_completes() {
    let (engine, _recorders) = engine(MockEvaluator::success());
    let mut request = sample_request();
    request.features_to_evaluate = "does_not_exist".to_string();

    let (report, _events) = run_collecting(&engine, request).await;

    assert!(report.is_success());
    assert_eq!(report.progress, Progress::new(5, 5));
    assert_eq!(report.outcome.unwrap().evaluated_count(), 0);
}

#[tokio::test]
async fn test_heartbeats_during_slow_stage() {
    let options = EngineOptions {
        heartbeat_interval: Duration::from_millis(15),
        ..fast_options()
    };
    let evaluator = MockEvaluator::success()
        .with_delay(Duration::from_millis(120))
        .without_reports();
    let (engine, _recorders) = engine_with(evaluator, options);

    let (report, events) = run_collecting(&engine, sample_request()).await;
    assert!(report.is_success());

    let custom: Vec<Progress> = processing(&events)
        .into_iter()
        .filter(|(step, _)| step == "Evaluating Custom features")
        .map(|(_, progress)| progress)
        .collect();

    // The start event, several heartbeats at unchanged progress, then the
    // settled update.
    assert!(custom.len() >= 4, "too few events during the slow stage: {custom:?}");
    assert!(custom[..custom.len() - 1]
        .iter()
        .all(|progress| *progress == custom[0]));
    assert_eq!(custom.last().unwrap().completed, custom[0].completed + 1);
    assert_monotonic(&events, SAMPLE_TOTAL);
}

#[tokio::test]
async fn test_stage_failure_emits_error_and_cleans_up() {
    let (engine, recorders) = engine(MockEvaluator::failing_on("speaker"));

    let (report, events) = run_collecting(&engine, sample_request()).await;

    let message = error_message(assert_single_terminal(&events)).to_string();
    assert!(message.starts_with("Evaluating Custom features failed"), "{message}");
    assert!(message.contains("speaker"));
    assert!(matches!(report.outcome, Err(PipelineError::Stage { .. })));

    // Nothing was credited for the failed stage.
    let last = processing(&events).last().unwrap().1;
    assert!(last.completed < SAMPLE_TOTAL);
    assert_eq!(report.progress, last);

    assert!(
        recorders.media.log.wait_for("cleanup", Duration::from_secs(2)),
        "cleanup never ran after the failure"
    );
}

#[tokio::test]
async fn test_media_failure_stops_before_evaluation() {
    let media = RecordingMedia {
        fail_trim: true,
        ..RecordingMedia::default()
    };
    let (collaborators, recorders) = with_media(MockEvaluator::success(), media);
    let engine = AssessmentEngine::new(sample_registry(), collaborators).with_options(fast_options());

    let (report, events) = run_collecting(&engine, sample_request()).await;

    let message = error_message(assert_single_terminal(&events)).to_string();
    assert_eq!(message, "Trimming video failed: ffmpeg exited with status 1");
    assert!(!announced_steps(&events)
        .iter()
        .any(|step| step.starts_with("Evaluating")));
    assert_eq!(report.progress, Progress::new(2, SAMPLE_TOTAL));
    assert!(recorders.media.log.wait_for("cleanup", Duration::from_secs(2)));
}

#[tokio::test]
async fn test_run_deadline_ends_run_with_error() {
    let options = EngineOptions {
        run_deadline: Some(Duration::from_millis(60)),
        ..fast_options()
    };
    let (engine, recorders) =
        engine_with(MockEvaluator::success().with_delay(Duration::from_millis(500)), options);

    let started = std::time::Instant::now();
    let (report, events) = run_collecting(&engine, sample_request()).await;

    assert!(started.elapsed() < Duration::from_millis(450), "deadline was not enforced");
    assert!(matches!(report.outcome, Err(PipelineError::DeadlineExceeded)));
    assert_eq!(
        error_message(assert_single_terminal(&events)),
        "run exceeded its deadline"
    );
    assert!(recorders.media.log.wait_for("cleanup", Duration::from_secs(3)));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let (engine, recorders) = engine(MockEvaluator::success());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut emitter = EventEmitter::new(WriterSink::new(Vec::new()), cancel.clone());

    let report = engine.run(sample_request(), &mut emitter, cancel).await;

    assert!(matches!(report.outcome, Err(PipelineError::Cancelled)));
    let events = parse_events(&emitter.into_sink().into_inner());
    assert_eq!(error_message(assert_single_terminal(&events)), "run was cancelled");
    assert!(!recorders.calls().iter().any(|call| call.starts_with("trim")));
}

#[tokio::test]
async fn test_client_disconnect_cancels_run() {
    let options = EngineOptions {
        heartbeat_interval: Duration::from_millis(10),
        ..fast_options()
    };
    let (engine, recorders) =
        engine_with(MockEvaluator::success().with_delay(Duration::from_millis(100)), options);

    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let mut emitter = EventEmitter::new(ChannelSink::new(tx), cancel.clone());

    let reader = tokio::spawn(async move {
        let first = rx.recv().await;
        drop(rx);
        first
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        engine.run(sample_request(), &mut emitter, cancel.clone()),
    )
    .await
    .expect("run did not stop after the client left");

    let first = reader.await.unwrap().expect("client saw the first event");
    assert!(first.starts_with(r#"{"status":"processing""#));

    assert!(!report.is_success());
    assert!(cancel.is_cancelled());
    assert!(!emitter.is_open());
    assert!(recorders.media.log.wait_for("cleanup", Duration::from_secs(3)));
}

#[tokio::test]
async fn test_concurrent_runs_keep_separate_progress() {
    let (engine, recorders) = engine(MockEvaluator::success().with_delay(Duration::from_millis(10)));
    let mut filtered = sample_request();
    filtered.features_to_evaluate = "cu_speaker".to_string();

    let ((full, full_events), (single, single_events)) = tokio::join!(
        run_collecting(&engine, sample_request()),
        run_collecting(&engine, filtered),
    );

    assert_ne!(full.run_id, single.run_id);
    let mut trimmed = recorders.media.trimmed_runs.calls();
    trimmed.sort();
    let mut expected = vec![full.run_id.to_string(), single.run_id.to_string()];
    expected.sort();
    assert_eq!(trimmed, expected, "each run prepares media under its own id");
    assert_eq!(full.progress, Progress::new(SAMPLE_TOTAL, SAMPLE_TOTAL));
    assert_eq!(single.progress, Progress::new(6, 6));
    assert_monotonic(&full_events, SAMPLE_TOTAL);
    assert_monotonic(&single_events, 6);
}
