//! Evaluator backed by an external command.
//!
//! The command is run once per check group. It receives a JSON description
//! of the group on stdin and must print one [`CheckVerdict`] JSON object per
//! check on stdout. Groups run concurrently on a bounded set of scoped
//! threads.

use crate::evaluators::base::{CheckEvaluator, EvaluationRequest, EvaluatorError};
use crate::evaluators::command_runner::CommandRunner;
use ak_protocol::check_models::{Check, CheckEvaluation, CheckVerdict};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;

pub struct CommandEvaluator {
    command: String,
    args: Vec<String>,
    max_parallel_groups: usize,
}

impl CommandEvaluator {
    pub fn new(command: impl Into<String>, args: Vec<String>, max_parallel_groups: usize) -> Self {
        Self {
            command: command.into(),
            args,
            max_parallel_groups: max_parallel_groups.max(1),
        }
    }

    fn evaluate_group(
        &self,
        request: &EvaluationRequest<'_>,
        group_key: &str,
        checks: &[Check],
    ) -> Result<Vec<CheckEvaluation>, EvaluatorError> {
        let input = group_input(request, group_key, checks);
        let input = serde_json::to_vec(&input)
            .map_err(|e| EvaluatorError::ExecutionError(format!("Failed to encode group: {e}")))?;

        let values = CommandRunner::run_json_lines(&self.command, &self.args, None, Some(input))?;

        let mut verdicts: HashMap<String, CheckVerdict> = HashMap::new();
        for value in values {
            let verdict: CheckVerdict = serde_json::from_value(value).map_err(|e| {
                EvaluatorError::OutputParseError(format!("Invalid verdict in group '{group_key}': {e}"))
            })?;
            verdicts.insert(verdict.id.clone(), verdict);
        }

        checks
            .iter()
            .map(|check| {
                verdicts
                    .remove(&check.id)
                    .map(|verdict| CheckEvaluation::from_verdict(check, verdict))
                    .ok_or_else(|| {
                        EvaluatorError::OutputParseError(format!(
                            "No verdict for check '{}' in group '{group_key}'",
                            check.id
                        ))
                    })
            })
            .collect()
    }
}

impl CheckEvaluator for CommandEvaluator {
    fn name(&self) -> &str {
        &self.command
    }

    fn check_availability(&self) -> bool {
        which::which(&self.command).is_ok()
    }

    fn evaluate(
        &self,
        request: &EvaluationRequest<'_>,
        on_group_complete: &(dyn Fn(&str) + Sync),
    ) -> anyhow::Result<Vec<CheckEvaluation>> {
        if request.groups.is_empty() {
            return Ok(Vec::new());
        }
        if !self.check_availability() {
            return Err(EvaluatorError::NotAvailable(format!(
                "'{}' was not found on PATH",
                self.command
            ))
            .into());
        }

        let queue = Mutex::new(request.groups.iter());
        let results: Mutex<BTreeMap<&str, Vec<CheckEvaluation>>> = Mutex::new(BTreeMap::new());
        let first_error: Mutex<Option<EvaluatorError>> = Mutex::new(None);
        let failed = AtomicBool::new(false);
        let workers = self.max_parallel_groups.min(request.groups.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if failed.load(Ordering::Acquire) {
                        return;
                    }
                    if request.cancel.is_cancelled() {
                        record_error(&first_error, &failed, EvaluatorError::Cancelled);
                        return;
                    }
                    let next = queue.lock().unwrap_or_else(|e| e.into_inner()).next();
                    let Some((group_key, checks)) = next else {
                        return;
                    };

                    match self.evaluate_group(request, group_key, checks) {
                        Ok(evaluations) => {
                            results
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .insert(group_key, evaluations);
                            on_group_complete(group_key);
                        }
                        Err(error) => {
                            record_error(&first_error, &failed, error);
                            return;
                        }
                    }
                });
            }
        });

        if let Some(error) = first_error.into_inner().unwrap_or_else(|e| e.into_inner()) {
            return Err(error.into());
        }

        Ok(results
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .into_values()
            .flatten()
            .collect())
    }
}

fn record_error(slot: &Mutex<Option<EvaluatorError>>, failed: &AtomicBool, error: EvaluatorError) {
    failed.store(true, Ordering::Release);
    let mut slot = slot.lock().unwrap_or_else(|e| e.into_inner());
    if slot.is_none() {
        *slot = Some(error);
    }
}

fn group_input(request: &EvaluationRequest<'_>, group_key: &str, checks: &[Check]) -> serde_json::Value {
    let config = request.config;
    json!({
        "category": request.category,
        "group_key": group_key,
        "media_uri": request.media_ref,
        "project_id": config.project_id,
        "use_llms": config.use_llms,
        "use_annotations": config.use_annotations,
        "llm": {
            "model_name": config.llm.model_name,
            "location": config.llm.location,
            "max_output_tokens": config.llm.max_output_tokens,
            "temperature": config.llm.temperature,
            "top_p": config.llm.top_p,
        },
        "brand": {
            "name": config.brand.name,
            "variations": config.brand.variations,
            "products": config.brand.products,
            "product_categories": config.brand.product_categories,
            "call_to_actions": config.brand.call_to_actions,
        },
        "checks": checks.iter().map(|check| json!({
            "id": check.id,
            "name": check.name,
            "video_segment": check.video_segment,
            "evaluation_criteria": check.evaluation_criteria,
            "evaluation_method": check.evaluation_method,
            "prompt": check.prompt_template,
            "extra_instructions": check.extra_instructions,
        })).collect::<Vec<_>>(),
    })
}
