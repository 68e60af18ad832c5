//! The ordered stage table for one run.
//!
//! A plan is computed once from the validated config and the registry. It
//! fixes the run's total and captures the exact check groups each
//! evaluation stage receives, so progress and evaluation never disagree
//! about what the registry contained.

use crate::config::assessment::AssessmentConfig;
use crate::registry::{CheckGroups, CheckRegistry};
use ak_protocol::check_models::CheckCategory;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum StageKind {
    Credentials,
    BuildConfig,
    Annotations,
    Trim,
    Evaluate {
        category: CheckCategory,
        groups: Arc<CheckGroups>,
    },
    BuildAssessment,
    Store,
    Cleanup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStage {
    pub label: &'static str,
    pub units: u64,
    pub kind: StageKind,
}

impl PlannedStage {
    fn fixed(label: &'static str, kind: StageKind) -> Self {
        Self {
            label,
            units: 1,
            kind,
        }
    }

    /// Group key to item count, for fan-out stages.
    pub fn group_counts(&self) -> Option<BTreeMap<String, u64>> {
        match &self.kind {
            StageKind::Evaluate { groups, .. } => Some(
                groups
                    .iter()
                    .map(|(key, checks)| (key.clone(), checks.len() as u64))
                    .collect(),
            ),
            _ => None,
        }
    }
}

pub fn evaluation_label(category: CheckCategory) -> &'static str {
    match category {
        CheckCategory::LongFormAbcd => "Evaluating long-form ABCD features",
        CheckCategory::Shorts => "Evaluating Shorts features",
        CheckCategory::Custom => "Evaluating Custom features",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePlan {
    stages: Vec<PlannedStage>,
}

impl PipelinePlan {
    pub fn build(config: &AssessmentConfig, registry: &CheckRegistry) -> Self {
        let mut stages = vec![
            PlannedStage::fixed("Setting up credentials", StageKind::Credentials),
            PlannedStage::fixed("Building configuration", StageKind::BuildConfig),
        ];

        if config.use_annotations && config.is_stored_media() {
            stages.push(PlannedStage::fixed(
                "Generating video annotations",
                StageKind::Annotations,
            ));
        }
        if config.run_long_form_abcd && config.is_stored_media() {
            stages.push(PlannedStage::fixed("Trimming video", StageKind::Trim));
        }

        for category in CheckCategory::ALL {
            if !category_enabled(config, category) {
                continue;
            }
            let groups = registry.enumerate(category, &config.check_filter);
            let units = groups.values().map(|checks| checks.len() as u64).sum();
            stages.push(PlannedStage {
                label: evaluation_label(category),
                units,
                kind: StageKind::Evaluate {
                    category,
                    groups: Arc::new(groups),
                },
            });
        }

        stages.push(PlannedStage::fixed(
            "Building assessment",
            StageKind::BuildAssessment,
        ));
        if config.storage.is_enabled() {
            stages.push(PlannedStage::fixed(
                "Storing results in BigQuery",
                StageKind::Store,
            ));
        }
        stages.push(PlannedStage::fixed("Cleaning up", StageKind::Cleanup));

        Self { stages }
    }

    pub fn total(&self) -> u64 {
        self.stages.iter().map(|stage| stage.units).sum()
    }

    pub fn stages(&self) -> &[PlannedStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.label).collect()
    }

    pub fn into_stages(self) -> Vec<PlannedStage> {
        self.stages
    }
}

fn category_enabled(config: &AssessmentConfig, category: CheckCategory) -> bool {
    match category {
        CheckCategory::LongFormAbcd => config.run_long_form_abcd,
        CheckCategory::Shorts => config.run_shorts,
        CheckCategory::Custom => config.run_custom,
    }
}
