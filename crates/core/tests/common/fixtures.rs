//! Test fixtures for registries, requests and on-disk projects.

use ak_core::config::loader::PROJECT_DIR;
use ak_core::engine::EngineOptions;
use ak_core::registry::CheckRegistry;
use ak_protocol::check_models::{
    Check, CheckCategory, CheckSubCategory, EvaluationMethod, VideoSegment,
};
use ak_protocol::request_models::AssessmentRequest;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const MEDIA_URI: &str = "gs://ads-bucket/campaign/spot.mp4";
pub const PROJECT_ID: &str = "test-project";

pub fn check(id: &str, category: CheckCategory, group_by: &str) -> Check {
    Check {
        id: id.to_string(),
        name: format!("Check {id}"),
        category,
        sub_category: CheckSubCategory::None,
        video_segment: VideoSegment::FullVideo,
        evaluation_criteria: format!("criteria for {id}"),
        prompt_template: format!("Evaluate {id}."),
        extra_instructions: vec![],
        evaluation_method: EvaluationMethod::Llms,
        evaluation_function: None,
        include_in_evaluation: true,
        group_by: group_by.to_string(),
    }
}

/// Long-form: `full` (2) + `opening` (1). Shorts: `full` (2). Custom:
/// `speaker` (1).
///
/// With default request flags the plan is credentials, config, trim,
/// 3 + 2 + 1 evaluation units, build and cleanup: a total of 11.
pub fn sample_registry() -> Arc<CheckRegistry> {
    Arc::new(
        CheckRegistry::new(vec![
            check("lf_pacing", CheckCategory::LongFormAbcd, "full"),
            check("lf_people", CheckCategory::LongFormAbcd, "full"),
            check("lf_dynamic_start", CheckCategory::LongFormAbcd, "opening"),
            check("sh_quality", CheckCategory::Shorts, "full"),
            check("sh_frame_rate", CheckCategory::Shorts, "full"),
            check("cu_speaker", CheckCategory::Custom, "speaker"),
        ])
        .expect("sample registry has unique ids"),
    )
}

pub const SAMPLE_TOTAL: u64 = 11;

pub fn sample_request() -> AssessmentRequest {
    let mut request = AssessmentRequest::new(MEDIA_URI, PROJECT_ID);
    request.brand_name = "Acme".to_string();
    request.brand_variations = "acme, ACME Corp".to_string();
    request
}

pub fn youtube_request() -> AssessmentRequest {
    let mut request = AssessmentRequest::new("https://www.youtube.com/watch?v=abc123", PROJECT_ID);
    request.creative_provider_type = "YOUTUBE".to_string();
    request
}

/// Millisecond cadence so timing tests stay fast.
pub fn fast_options() -> EngineOptions {
    EngineOptions {
        poll_interval: Duration::from_millis(5),
        heartbeat_interval: Duration::from_secs(5),
        run_deadline: None,
        completion_buffer: 64,
    }
}

/// A project root with `.assess-kit/config.toml` and one check per
/// category.
#[allow(dead_code)]
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let ak_dir = temp_dir.path().join(PROJECT_DIR);
    std::fs::create_dir_all(ak_dir.join("checks/long_form"))?;
    std::fs::create_dir_all(ak_dir.join("checks/shorts"))?;
    std::fs::create_dir_all(ak_dir.join("checks/custom"))?;

    std::fs::write(
        ak_dir.join("config.toml"),
        r#"
[stream]
poll_interval_ms = 5
heartbeat_interval_ms = 1000

[storage]
root = "results"
"#,
    )?;

    let checks = [
        ("long_form/a_supers.md", "a_supers", "LONG_FORM_ABCD", "FULL_VIDEO"),
        ("long_form/a_dynamic_start.md", "a_dynamic_start", "LONG_FORM_ABCD", "FIRST_5_SECS_VIDEO"),
        ("shorts/gc_high_video_quality.md", "gc_high_video_quality", "SHORTS", "FULL_VIDEO"),
        ("custom/speaker.md", "speaker", "CUSTOM", "FULL_VIDEO"),
    ];
    for (file, id, category, segment) in checks {
        std::fs::write(
            ak_dir.join("checks").join(file),
            format!(
                "---\nid: {id}\nname: {id}\ncategory: {category}\nvideo_segment: {segment}\n---\n\nEvaluate {id}.\n"
            ),
        )?;
    }

    Ok(temp_dir)
}
