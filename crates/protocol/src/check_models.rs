//! Check definition models for `.assess-kit/checks/**/*.md`.
//!
//! A check is one independent, named evaluation performed against a piece of
//! media. Checks are grouped by category (which evaluation stage runs them)
//! and by group key (which checks the evaluator handles together).

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// The evaluation stage a check belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckCategory {
    /// Long-form ABCD creative checks.
    LongFormAbcd,
    /// Checks specific to short-form (Shorts) media.
    Shorts,
    /// Project-specific checks.
    Custom,
}

impl CheckCategory {
    /// All categories, in the order the pipeline evaluates them.
    pub const ALL: [CheckCategory; 3] = [
        CheckCategory::LongFormAbcd,
        CheckCategory::Shorts,
        CheckCategory::Custom,
    ];

    /// The wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LongFormAbcd => "LONG_FORM_ABCD",
            Self::Shorts => "SHORTS",
            Self::Custom => "CUSTOM",
        }
    }

    /// Parse a category from its wire name, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ABCD sub-category of a check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckSubCategory {
    Attract,
    Brand,
    Connect,
    Direct,
    #[default]
    None,
}

/// The portion of the media a check looks at.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
pub enum VideoSegment {
    #[serde(rename = "FULL_VIDEO")]
    #[default]
    FullVideo,
    #[serde(rename = "FIRST_5_SECS_VIDEO")]
    First5SecsVideo,
    #[serde(rename = "LAST_5_SECS_VIDEO")]
    Last5SecsVideo,
    #[serde(rename = "NO_GROUPING")]
    NoGrouping,
}

impl VideoSegment {
    /// The wire name of the segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullVideo => "FULL_VIDEO",
            Self::First5SecsVideo => "FIRST_5_SECS_VIDEO",
            Self::Last5SecsVideo => "LAST_5_SECS_VIDEO",
            Self::NoGrouping => "NO_GROUPING",
        }
    }
}

/// How the evaluator decides a check.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationMethod {
    LlmsAndAnnotations,
    #[default]
    Llms,
    LlmsCategorical,
    Annotations,
}

/// A single check definition.
///
/// Checks are defined in `.assess-kit/checks/**/*.md` files with YAML front
/// matter containing the metadata and the file body containing the prompt
/// template.
///
/// # Example
///
/// ```markdown
/// ---
/// id: a_supers
/// name: Supers
/// category: LONG_FORM_ABCD
/// sub_category: ATTRACT
/// video_segment: FULL_VIDEO
/// evaluation_criteria: Any text overlay on the video.
/// group_by: FULL_VIDEO
/// ---
///
/// Does the video contain supers (text overlays)?
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Check {
    /// Unique identifier, also used by the `features_to_evaluate` filter.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    pub category: CheckCategory,

    #[serde(default)]
    pub sub_category: CheckSubCategory,

    #[serde(default)]
    pub video_segment: VideoSegment,

    /// What the evaluator is looking for.
    #[serde(default)]
    pub evaluation_criteria: String,

    /// Prompt sent to the evaluator. Taken from the Markdown body, so it is
    /// not part of the front matter.
    #[serde(skip)]
    pub prompt_template: String,

    #[serde(default)]
    pub extra_instructions: Vec<String>,

    #[serde(default)]
    pub evaluation_method: EvaluationMethod,

    /// Name of the annotation function for annotation-based checks.
    #[serde(default)]
    pub evaluation_function: Option<String>,

    /// Disabled checks stay in the registry but are never enumerated.
    #[serde(default = "default_true")]
    pub include_in_evaluation: bool,

    /// Group key. Checks sharing a key are evaluated together.
    /// Empty means "group by video segment".
    #[serde(default)]
    pub group_by: String,
}

fn default_true() -> bool {
    true
}

impl Check {
    /// The key this check is grouped under.
    pub fn group_key(&self) -> &str {
        if self.group_by.is_empty() {
            self.video_segment.as_str()
        } else {
            &self.group_by
        }
    }
}

/// The outcome the evaluator reports for one check.
///
/// This is the shape external evaluators emit, one JSON object per line,
/// keyed by check `id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct CheckVerdict {
    pub id: String,
    pub detected: bool,
    pub confidence_score: f64,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
    /// Categorical checks put their JSON-encoded answer here.
    #[serde(default)]
    pub evaluation: String,
}

/// The evaluation of one check, as it appears in an assessment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct CheckEvaluation {
    pub feature_id: String,
    pub feature_name: String,
    pub category: CheckCategory,
    pub sub_category: CheckSubCategory,
    pub video_segment: VideoSegment,
    pub evaluation_criteria: String,
    pub detected: bool,
    pub confidence_score: f64,
    pub rationale: String,
    pub evidence: String,
    pub strengths: String,
    pub weaknesses: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub evaluation: String,
}

impl CheckEvaluation {
    /// Combine a check definition with the verdict reported for it.
    pub fn from_verdict(check: &Check, verdict: CheckVerdict) -> Self {
        Self {
            feature_id: check.id.clone(),
            feature_name: check.name.clone(),
            category: check.category,
            sub_category: check.sub_category,
            video_segment: check.video_segment,
            evaluation_criteria: check.evaluation_criteria.trim().to_string(),
            detected: verdict.detected,
            confidence_score: verdict.confidence_score,
            rationale: verdict.rationale,
            evidence: verdict.evidence,
            strengths: verdict.strengths,
            weaknesses: verdict.weaknesses,
            evaluation: verdict.evaluation,
        }
    }
}
