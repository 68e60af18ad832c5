//! Assessment request model.
//!
//! The request is a flat object so that it can be posted as-is by simple
//! HTTP clients. Every field except the media locator and the project id has
//! a default, and list-valued fields are comma-separated strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// The family of storage the media locator points into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreativeProviderType {
    /// Google Cloud Storage; locators must use the `gs://` scheme.
    Gcs,
    /// YouTube; locators must point at `youtube.com`.
    Youtube,
}

impl CreativeProviderType {
    /// Parse a provider tag, ignoring case.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "GCS" => Some(Self::Gcs),
            "YOUTUBE" => Some(Self::Youtube),
            _ => None,
        }
    }

    /// The marker a locator of this family must contain.
    pub fn locator_marker(&self) -> &'static str {
        match self {
            Self::Gcs => "gs://",
            Self::Youtube => "youtube.com",
        }
    }
}

impl fmt::Display for CreativeProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gcs => f.write_str("GCS"),
            Self::Youtube => f.write_str("YOUTUBE"),
        }
    }
}

/// A request to assess one piece of media.
///
/// # Example
///
/// ```json
/// {
///   "gcs_uri": "gs://bucket/video.mp4",
///   "project_id": "my-project",
///   "brand_name": "Acme",
///   "run_shorts": false,
///   "features_to_evaluate": "a_supers,b_brand_mention"
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct AssessmentRequest {
    /// Media locator: a `gs://` URI or a YouTube URL.
    pub gcs_uri: String,

    pub project_id: String,

    /// Derived from the locator when empty and the locator is `gs://`.
    #[serde(default)]
    pub bucket_name: String,

    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub brand_variations: String,
    #[serde(default)]
    pub products: String,
    #[serde(default)]
    pub products_categories: String,
    #[serde(default)]
    pub call_to_actions: String,

    #[serde(default)]
    pub use_annotations: bool,
    #[serde(default = "default_true")]
    pub run_long_form_abcd: bool,
    #[serde(default = "default_true")]
    pub run_shorts: bool,
    #[serde(default = "default_true")]
    pub run_custom: bool,

    #[serde(default = "default_region")]
    pub project_zone: String,
    #[serde(default = "default_true")]
    pub use_llms: bool,
    /// `None` means "extract when no brand name was given".
    #[serde(default)]
    pub extract_brand_metadata: Option<bool>,
    #[serde(default = "default_true")]
    pub verbose: bool,

    /// Provider tag, `GCS` or `YOUTUBE`. Kept as a string so that an unknown
    /// tag is reported as a validation error rather than a decode error.
    #[serde(default = "default_provider")]
    pub creative_provider_type: String,

    /// Comma-separated check ids. Empty means all checks.
    #[serde(default)]
    pub features_to_evaluate: String,

    #[serde(default)]
    pub bq_dataset_name: String,
    #[serde(default)]
    pub bq_table_name: String,
    #[serde(default)]
    pub assessment_file: String,
    #[serde(default)]
    pub knowledge_graph_api_key: String,

    #[serde(default = "default_llm_name")]
    pub llm_name: String,
    #[serde(default = "default_region")]
    pub llm_location: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    #[serde(default = "default_early_time_seconds")]
    pub early_time_seconds: f64,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_face_surface_threshold")]
    pub face_surface_threshold: f64,
    #[serde(default = "default_logo_size_threshold")]
    pub logo_size_threshold: f64,
    #[serde(default = "default_avg_shot_duration_seconds")]
    pub avg_shot_duration_seconds: f64,
    #[serde(default = "default_dynamic_cutoff_ms")]
    pub dynamic_cutoff_ms: f64,
}

impl AssessmentRequest {
    /// A request with every optional field at its default.
    pub fn new(gcs_uri: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            gcs_uri: gcs_uri.into(),
            project_id: project_id.into(),
            bucket_name: String::new(),
            brand_name: String::new(),
            brand_variations: String::new(),
            products: String::new(),
            products_categories: String::new(),
            call_to_actions: String::new(),
            use_annotations: false,
            run_long_form_abcd: true,
            run_shorts: true,
            run_custom: true,
            project_zone: default_region(),
            use_llms: true,
            extract_brand_metadata: None,
            verbose: true,
            creative_provider_type: default_provider(),
            features_to_evaluate: String::new(),
            bq_dataset_name: String::new(),
            bq_table_name: String::new(),
            assessment_file: String::new(),
            knowledge_graph_api_key: String::new(),
            llm_name: default_llm_name(),
            llm_location: default_region(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            early_time_seconds: default_early_time_seconds(),
            confidence_threshold: default_confidence_threshold(),
            face_surface_threshold: default_face_surface_threshold(),
            logo_size_threshold: default_logo_size_threshold(),
            avg_shot_duration_seconds: default_avg_shot_duration_seconds(),
            dynamic_cutoff_ms: default_dynamic_cutoff_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    "us-central1".to_string()
}

fn default_provider() -> String {
    "GCS".to_string()
}

fn default_llm_name() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_max_output_tokens() -> u32 {
    65535
}

fn default_temperature() -> f64 {
    1.0
}

fn default_top_p() -> f64 {
    0.95
}

fn default_early_time_seconds() -> f64 {
    5.0
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_face_surface_threshold() -> f64 {
    0.15
}

fn default_logo_size_threshold() -> f64 {
    3.5
}

fn default_avg_shot_duration_seconds() -> f64 {
    2.0
}

fn default_dynamic_cutoff_ms() -> f64 {
    3000.0
}
