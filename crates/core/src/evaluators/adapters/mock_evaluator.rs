//! Mock evaluator for tests and unconfigured installs.

use crate::evaluators::base::{CheckEvaluator, EvaluationRequest, EvaluatorError};
use ak_protocol::check_models::{CheckEvaluation, CheckVerdict};
use std::time::Duration;

/// Produces a deterministic verdict for every check.
///
/// A check is marked detected when its position within its group is even.
#[derive(Debug, Clone)]
pub struct MockEvaluator {
    available: bool,
    delay_per_group: Duration,
    fail_on_group: Option<String>,
    report_groups: bool,
}

impl Default for MockEvaluator {
    fn default() -> Self {
        Self::success()
    }
}

impl MockEvaluator {
    pub fn success() -> Self {
        Self {
            available: true,
            delay_per_group: Duration::ZERO,
            fail_on_group: None,
            report_groups: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::success()
        }
    }

    /// Fails when it reaches `group_key`, after reporting earlier groups.
    pub fn failing_on(group_key: impl Into<String>) -> Self {
        Self {
            fail_on_group: Some(group_key.into()),
            ..Self::success()
        }
    }

    pub fn with_delay(mut self, delay_per_group: Duration) -> Self {
        self.delay_per_group = delay_per_group;
        self
    }

    /// Never call the completion callback; the stage settles on return.
    pub fn without_reports(mut self) -> Self {
        self.report_groups = false;
        self
    }
}

impl CheckEvaluator for MockEvaluator {
    fn name(&self) -> &str {
        "mock"
    }

    fn check_availability(&self) -> bool {
        self.available
    }

    fn evaluate(
        &self,
        request: &EvaluationRequest<'_>,
        on_group_complete: &(dyn Fn(&str) + Sync),
    ) -> anyhow::Result<Vec<CheckEvaluation>> {
        if !self.available {
            return Err(EvaluatorError::NotAvailable("Mock evaluator not available".to_string()).into());
        }

        let mut evaluations = Vec::new();
        for (group_key, checks) in request.groups {
            if request.cancel.is_cancelled() {
                return Err(EvaluatorError::Cancelled.into());
            }
            if !self.delay_per_group.is_zero() {
                std::thread::sleep(self.delay_per_group);
            }
            if self.fail_on_group.as_deref() == Some(group_key.as_str()) {
                return Err(EvaluatorError::ExecutionError(format!(
                    "Mock failure in group '{group_key}'"
                ))
                .into());
            }

            for (index, check) in checks.iter().enumerate() {
                let detected = index % 2 == 0;
                let verdict = CheckVerdict {
                    id: check.id.clone(),
                    detected,
                    confidence_score: if detected { 0.9 } else { 0.2 },
                    rationale: format!("Mock rationale for {}", check.name),
                    ..CheckVerdict::default()
                };
                evaluations.push(CheckEvaluation::from_verdict(check, verdict));
            }

            if self.report_groups {
                on_group_complete(group_key);
            }
        }
        Ok(evaluations)
    }
}
