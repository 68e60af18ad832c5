//! Error types for configuration loading and request validation.
//!
//! This module defines all errors that can occur while reading the
//! `.assess-kit/` directory and while turning an assessment request into a
//! validated [`AssessmentConfig`](crate::config::assessment::AssessmentConfig).

use ak_protocol::CreativeProviderType;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading or validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to parse Markdown front matter of a check definition.
    #[error("Failed to parse Markdown front matter in {path}: {reason}")]
    MarkdownParse { path: PathBuf, reason: String },

    /// Failed to walk directory structure.
    #[error("Failed to traverse directory {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// Invalid configuration structure or missing required fields.
    #[error("Invalid configuration in {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    /// Two check definitions share the same id.
    #[error("Duplicate check id '{id}'")]
    DuplicateCheck { id: String },

    /// The request named a provider family that does not exist.
    #[error("Unknown creative provider type '{0}'. Expected GCS or YOUTUBE.")]
    UnknownProvider(String),

    /// The media locator does not belong to the declared provider family.
    #[error(
        "Creative provider {provider} does not match video URI {uri}. Expected {} locator.",
        .provider.locator_marker()
    )]
    ProviderMismatch {
        provider: CreativeProviderType,
        uri: String,
    },

    /// A required request field was empty.
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// A numeric request parameter is out of range.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A storage dataset or table name is not a single plain identifier.
    #[error("Invalid value for '{field}': '{value}' may only contain letters, digits, '_' and '-'")]
    InvalidStorageName { field: &'static str, value: String },
}

impl ConfigError {
    /// Whether this error was caused by the request rather than by local files.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownProvider(_)
                | Self::ProviderMismatch { .. }
                | Self::MissingField(_)
                | Self::InvalidParameter { .. }
                | Self::InvalidStorageName { .. }
        )
    }
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
