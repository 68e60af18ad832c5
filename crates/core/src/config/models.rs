//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! service settings and check definitions into a single configuration
//! object.

use crate::config::settings::ServiceSettings;
use ak_protocol::check_models::Check;

/// Unified application configuration loaded from `.assess-kit/` directory.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Service settings
/// - `checks/**/*.md`: Check definitions
///
/// # Example
///
/// ```rust,no_run
/// use ak_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} checks", config.checks.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Service settings from `config.toml`.
    pub settings: ServiceSettings,

    /// All check definitions loaded from `checks/**/*.md`.
    pub checks: Vec<Check>,
}
