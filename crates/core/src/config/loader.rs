//! Configuration file loader for `.assess-kit/` directory structure.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.assess-kit/` directory, including:
//! - `config.toml`: Service settings
//! - `checks/**/*.md`: Check definitions with YAML front matter

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use crate::config::settings::ServiceSettings;
use ak_protocol::check_models::Check;
use gray_matter::engine::YAML;
use gray_matter::Matter;
use std::collections::HashSet;
use std::path::Path;
use walkdir::WalkDir;

/// Name of the project directory holding settings and checks.
pub const PROJECT_DIR: &str = ".assess-kit";

/// Loads all configuration from the `.assess-kit/` directory.
///
/// This function scans the `.assess-kit/` directory and loads:
/// - Service settings from `config.toml`
/// - Check definitions from `checks/**/*.md` files
///
/// # Arguments
///
/// * `root` - Root directory containing the `.assess-kit/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If directories or files
/// are missing (but the root exists), returns an empty/default configuration
/// rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML or Markdown front matter)
/// - Two checks share an id
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let ak_dir = root.join(PROJECT_DIR);

    if !ak_dir.exists() {
        return Ok(AppConfig::default());
    }

    let settings = load_settings(&ak_dir)?;
    let checks = load_checks(&ak_dir)?;

    tracing::debug!(
        dir = %ak_dir.display(),
        checks = checks.len(),
        "loaded configuration"
    );

    Ok(AppConfig { settings, checks })
}

/// Loads service settings from `config.toml`.
fn load_settings(ak_dir: &Path) -> ConfigResult<ServiceSettings> {
    let config_path = ak_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(ServiceSettings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: ServiceSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if settings.stream.poll_interval_ms == 0 || settings.stream.heartbeat_interval_ms == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "stream intervals must be greater than zero".to_string(),
        });
    }

    Ok(settings)
}

/// Loads all check definitions from `checks/**/*.md`.
///
/// Files are visited in path order so that the registry is deterministic.
fn load_checks(ak_dir: &Path) -> ConfigResult<Vec<Check>> {
    let checks_dir = ak_dir.join("checks");

    if !checks_dir.exists() {
        return Ok(Vec::new());
    }

    let mut checks = Vec::new();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(&checks_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: checks_dir.clone(),
            source,
        })?;

        let path = entry.path();

        if !entry.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("md")
        {
            continue;
        }

        let check = parse_check_file(path)?;

        if !seen.insert(check.id.clone()) {
            return Err(ConfigError::DuplicateCheck { id: check.id });
        }

        checks.push(check);
    }

    Ok(checks)
}

/// Parses one Markdown check definition.
fn parse_check_file(path: &Path) -> ConfigResult<Check> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let matter = Matter::<YAML>::new();
    let result = matter.parse(&content);

    let mut check: Check = result
        .data
        .ok_or_else(|| ConfigError::MarkdownParse {
            path: path.to_path_buf(),
            reason: "Missing YAML front matter".to_string(),
        })?
        .deserialize()
        .map_err(|e| ConfigError::MarkdownParse {
            path: path.to_path_buf(),
            reason: format!("Failed to deserialize front matter: {e}"),
        })?;

    if check.id.trim().is_empty() {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "check id must not be empty".to_string(),
        });
    }

    check.prompt_template = result.content.trim().to_string();

    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ak_protocol::check_models::{CheckCategory, VideoSegment};
    use std::fs;
    use tempfile::tempdir;

    fn write_check(dir: &Path, file: &str, id: &str, category: &str, group_by: &str) {
        let content = format!(
            "---\nid: {id}\nname: Check {id}\ncategory: {category}\nvideo_segment: FULL_VIDEO\ngroup_by: \"{group_by}\"\n---\n\nPrompt for {id}.\n"
        );
        fs::write(dir.join(file), content).expect("Failed to write check file");
    }

    #[tokio::test]
    async fn test_load_config_acceptance() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let ak_dir = root.join(PROJECT_DIR);

        fs::create_dir_all(ak_dir.join("checks/long_form")).expect("Failed to create checks dir");
        fs::create_dir_all(ak_dir.join("checks/shorts")).expect("Failed to create checks dir");

        fs::write(
            ak_dir.join("config.toml"),
            "[stream]\nheartbeat_interval_ms = 1000\n",
        )
        .expect("Failed to write config.toml");

        let check_md = r#"---
id: a_supers
name: Supers
category: LONG_FORM_ABCD
sub_category: ATTRACT
video_segment: FULL_VIDEO
evaluation_criteria: Any text overlay on the video.
---

Does the video contain supers?
Answer with a verdict."#;
        fs::write(ak_dir.join("checks/long_form/a_supers.md"), check_md)
            .expect("Failed to write check file");
        write_check(
            &ak_dir.join("checks/shorts"),
            "s_pacing.md",
            "s_pacing",
            "SHORTS",
            "",
        );

        let config = load_config(root).await.expect("Failed to load config");

        assert_eq!(config.settings.stream.heartbeat_interval_ms, 1000);
        assert_eq!(config.checks.len(), 2);

        let supers = &config.checks[0];
        assert_eq!(supers.id, "a_supers");
        assert_eq!(supers.category, CheckCategory::LongFormAbcd);
        assert_eq!(supers.video_segment, VideoSegment::FullVideo);
        assert!(supers.prompt_template.starts_with("Does the video contain supers?"));
        assert!(supers.prompt_template.ends_with("Answer with a verdict."));

        assert_eq!(config.checks[1].category, CheckCategory::Shorts);
    }

    #[tokio::test]
    async fn test_load_config_empty_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config(dir.path()).await.expect("Failed to load config");

        assert_eq!(config.settings, ServiceSettings::default());
        assert!(config.checks.is_empty());
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let ak_dir = dir.path().join(PROJECT_DIR);
        fs::create_dir_all(&ak_dir).expect("Failed to create dir");
        fs::write(ak_dir.join("config.toml"), "[stream\npoll = ").expect("Failed to write");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[tokio::test]
    async fn test_load_config_rejects_zero_interval() {
        let dir = tempdir().expect("Failed to create temp dir");
        let ak_dir = dir.path().join(PROJECT_DIR);
        fs::create_dir_all(&ak_dir).expect("Failed to create dir");
        fs::write(ak_dir.join("config.toml"), "[stream]\npoll_interval_ms = 0\n")
            .expect("Failed to write");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_load_config_check_no_frontmatter() {
        let dir = tempdir().expect("Failed to create temp dir");
        let checks_dir = dir.path().join(PROJECT_DIR).join("checks");
        fs::create_dir_all(&checks_dir).expect("Failed to create dir");
        fs::write(checks_dir.join("plain.md"), "Just a prompt, no metadata.")
            .expect("Failed to write");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::MarkdownParse { .. })));
    }

    #[tokio::test]
    async fn test_load_config_check_unknown_category() {
        let dir = tempdir().expect("Failed to create temp dir");
        let checks_dir = dir.path().join(PROJECT_DIR).join("checks");
        fs::create_dir_all(&checks_dir).expect("Failed to create dir");
        write_check(&checks_dir, "bad.md", "bad", "GYM_CLASS", "");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::MarkdownParse { .. })));
    }

    #[tokio::test]
    async fn test_load_config_duplicate_ids() {
        let dir = tempdir().expect("Failed to create temp dir");
        let checks_dir = dir.path().join(PROJECT_DIR).join("checks");
        fs::create_dir_all(&checks_dir).expect("Failed to create dir");
        write_check(&checks_dir, "one.md", "same", "SHORTS", "");
        write_check(&checks_dir, "two.md", "same", "CUSTOM", "");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::DuplicateCheck { id }) if id == "same"));
    }

    #[tokio::test]
    async fn test_load_config_ignores_non_matching_files() {
        let dir = tempdir().expect("Failed to create temp dir");
        let checks_dir = dir.path().join(PROJECT_DIR).join("checks");
        fs::create_dir_all(&checks_dir).expect("Failed to create dir");
        write_check(&checks_dir, "kept.md", "kept", "CUSTOM", "speaker");
        fs::write(checks_dir.join("README.txt"), "not a check").expect("Failed to write");
        fs::write(checks_dir.join("notes.yaml"), "id: nope").expect("Failed to write");

        let config = load_config(dir.path()).await.expect("Failed to load config");
        assert_eq!(config.checks.len(), 1);
        assert_eq!(config.checks[0].group_key(), "speaker");
    }
}
