//! Result store writing JSON Lines files.

use crate::config::assessment::{is_storage_identifier, AssessmentConfig};
use crate::evaluators::base::ResultStore;
use ak_protocol::assessment_models::Assessment;
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends each assessment as one line of `<root>/<dataset>/<table>.jsonl`.
///
/// An empty dataset name maps to `default`. Names that are not plain
/// identifiers are refused so that every file stays below the root.
pub struct JsonlResultStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

#[derive(Serialize)]
struct StoredAssessment<'a> {
    stored_at: String,
    project_id: &'a str,
    #[serde(flatten)]
    assessment: &'a Assessment,
}

impl JsonlResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, config: &AssessmentConfig) -> anyhow::Result<PathBuf> {
        let storage = &config.storage;
        anyhow::ensure!(
            is_storage_identifier(&storage.dataset) && is_storage_identifier(&storage.table),
            "refusing to store into dataset '{}' table '{}'",
            storage.dataset,
            storage.table
        );
        let dataset = if storage.dataset.is_empty() {
            "default"
        } else {
            storage.dataset.as_str()
        };
        Ok(self.root.join(dataset).join(format!("{}.jsonl", storage.table)))
    }
}

impl ResultStore for JsonlResultStore {
    fn store(&self, config: &AssessmentConfig, assessment: &Assessment) -> anyhow::Result<()> {
        anyhow::ensure!(config.storage.is_enabled(), "no result table configured");

        let path = self.table_path(config)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let record = StoredAssessment {
            stored_at: Utc::now().to_rfc3339(),
            project_id: &config.project_id,
            assessment,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::info!(path = %path.display(), "assessment stored");
        Ok(())
    }
}
