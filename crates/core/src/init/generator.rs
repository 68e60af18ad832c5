//! Directory structure and file generation for `.assess-kit/`.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::loader::PROJECT_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Check templates written by `--minimal`.
const MINIMAL_CHECKS: &str = "checks/long_form_abcd/";

#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Directory that receives `.assess-kit/`.
    pub target_dir: PathBuf,

    /// Overwrite an existing `.assess-kit/` directory.
    pub force: bool,

    /// Only write `config.toml` and the long-form ABCD checks.
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

/// Generate the `.assess-kit/` directory:
///
/// ```text
/// .assess-kit/
/// ├── config.toml
/// └── checks/
///     ├── long_form_abcd/*.md
///     ├── shorts/*.md   (unless minimal)
///     └── custom/*.md   (unless minimal)
/// ```
///
/// Returns the written paths, relative to `.assess-kit/`.
///
/// # Errors
///
/// Fails with [`InitError::DirectoryExists`] when the directory is already
/// there and `force` is not set, or when a file cannot be written.
pub async fn generate_assess_kit_structure(options: InitOptions) -> InitResult<Vec<String>> {
    let ak_dir = options.target_dir.join(PROJECT_DIR);

    if ak_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(ak_dir));
    }

    let checks_prefix = if options.minimal {
        MINIMAL_CHECKS
    } else {
        "checks/"
    };

    let mut written = vec!["config.toml".to_string()];
    written.extend(list_templates(checks_prefix));

    for template_path in &written {
        write_template_file(&ak_dir, template_path)?;
    }

    tracing::info!(dir = %ak_dir.display(), files = written.len(), "initialized project");
    Ok(written)
}

fn write_template_file(ak_dir: &Path, template_path: &str) -> InitResult<()> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = ak_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path,
        source,
    })
}
