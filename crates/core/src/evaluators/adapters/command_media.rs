//! Media preparation through configured external commands.

use crate::config::assessment::AssessmentConfig;
use crate::config::settings::MediaSettings;
use crate::evaluators::base::MediaPreparer;
use crate::evaluators::command_runner::CommandRunner;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Runs the `[media]` commands from `config.toml`.
///
/// Every argument has `{uri}`, `{bucket}`, `{project}` and `{workdir}`
/// substituted. `{workdir}` is a per-run scratch directory below a
/// temporary root owned by the preparer, so concurrent runs on the same
/// media never share files. A step without a command does nothing.
pub struct CommandMediaPreparer {
    annotate_command: Option<Vec<String>>,
    trim_command: Option<Vec<String>>,
    scratch: TempDir,
}

impl CommandMediaPreparer {
    pub fn new(settings: &MediaSettings) -> std::io::Result<Self> {
        Ok(Self {
            annotate_command: settings.annotate_command.clone(),
            trim_command: settings.trim_command.clone(),
            scratch: tempfile::Builder::new().prefix("ak-media-").tempdir()?,
        })
    }

    /// Scratch directory of the run `config` belongs to.
    pub fn workdir(&self, config: &AssessmentConfig) -> PathBuf {
        self.scratch
            .path()
            .join(config.run_id.simple().to_string())
    }

    fn run_step(
        &self,
        step: &str,
        command: Option<&[String]>,
        config: &AssessmentConfig,
    ) -> anyhow::Result<()> {
        let Some((program, args)) = command.and_then(<[String]>::split_first) else {
            tracing::debug!(step, "no command configured; skipping");
            return Ok(());
        };

        let workdir = self.workdir(config);
        std::fs::create_dir_all(&workdir)
            .with_context(|| format!("failed to create {}", workdir.display()))?;

        let args: Vec<String> = args
            .iter()
            .map(|arg| substitute(arg, config, &workdir))
            .collect();

        tracing::info!(step, program = %program, "running media command");
        CommandRunner::run(program, &args, Some(&workdir), None)
            .with_context(|| format!("{step} command failed"))?;
        Ok(())
    }
}

impl MediaPreparer for CommandMediaPreparer {
    fn generate_annotations(&self, config: &AssessmentConfig) -> anyhow::Result<()> {
        self.run_step("annotate", self.annotate_command.as_deref(), config)
    }

    fn trim(&self, config: &AssessmentConfig) -> anyhow::Result<()> {
        self.run_step("trim", self.trim_command.as_deref(), config)
    }

    fn remove_local_files(&self, config: &AssessmentConfig) -> anyhow::Result<()> {
        let workdir = self.workdir(config);
        if workdir.exists() {
            std::fs::remove_dir_all(&workdir)
                .with_context(|| format!("failed to remove {}", workdir.display()))?;
        }
        Ok(())
    }
}

fn substitute(arg: &str, config: &AssessmentConfig, workdir: &Path) -> String {
    arg.replace("{uri}", &config.media_uri)
        .replace("{bucket}", &config.bucket_name)
        .replace("{project}", &config.project_id)
        .replace("{workdir}", &workdir.to_string_lossy())
}
