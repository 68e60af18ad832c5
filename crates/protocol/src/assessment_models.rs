//! The assembled assessment returned to clients.

use crate::check_models::{CheckCategory, CheckEvaluation};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The evaluation of one piece of media across all enabled check categories.
///
/// Categories that were not run are present as empty lists.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, TS)]
pub struct Assessment {
    pub brand_name: String,
    pub video_uri: String,
    #[serde(default)]
    pub long_form_abcd_evaluated_features: Vec<CheckEvaluation>,
    #[serde(default)]
    pub shorts_evaluated_features: Vec<CheckEvaluation>,
    #[serde(default)]
    pub custom_evaluated_features: Vec<CheckEvaluation>,
}

impl Assessment {
    /// Evaluations for one category.
    pub fn evaluations(&self, category: CheckCategory) -> &[CheckEvaluation] {
        match category {
            CheckCategory::LongFormAbcd => &self.long_form_abcd_evaluated_features,
            CheckCategory::Shorts => &self.shorts_evaluated_features,
            CheckCategory::Custom => &self.custom_evaluated_features,
        }
    }

    /// Replace the evaluations for one category.
    pub fn set_evaluations(&mut self, category: CheckCategory, evaluations: Vec<CheckEvaluation>) {
        match category {
            CheckCategory::LongFormAbcd => self.long_form_abcd_evaluated_features = evaluations,
            CheckCategory::Shorts => self.shorts_evaluated_features = evaluations,
            CheckCategory::Custom => self.custom_evaluated_features = evaluations,
        }
    }

    /// Total number of evaluated checks.
    pub fn evaluated_count(&self) -> usize {
        self.long_form_abcd_evaluated_features.len()
            + self.shorts_evaluated_features.len()
            + self.custom_evaluated_features.len()
    }
}
