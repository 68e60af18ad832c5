//! Scoped service-account credentials.
//!
//! A [`CredentialSource`] says where the credential JSON comes from.
//! Acquiring it writes the JSON to a private temporary file that lives
//! exactly as long as the returned [`CredentialScope`].

use anyhow::Context;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// Runs proceed without a credential file.
    #[default]
    None,
    /// JSON read from this environment variable at acquisition time.
    Env(String),
    /// JSON supplied directly.
    Inline(String),
}

impl CredentialSource {
    pub fn from_env_setting(var: Option<&str>) -> Self {
        match var {
            Some(var) if !var.is_empty() => Self::Env(var.to_string()),
            _ => Self::None,
        }
    }

    /// Materialise the credentials. `Ok(None)` when there is nothing to do.
    pub fn acquire(&self) -> anyhow::Result<Option<CredentialScope>> {
        let json = match self {
            Self::None => return Ok(None),
            Self::Env(var) => std::env::var(var)
                .with_context(|| format!("credential variable {var} is not set"))?,
            Self::Inline(json) => json.clone(),
        };

        serde_json::from_str::<serde_json::Value>(&json)
            .context("credentials are not valid JSON")?;

        let mut file = tempfile::Builder::new()
            .prefix("ak-credentials-")
            .suffix(".json")
            .tempfile()
            .context("failed to create credential file")?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.flush())
            .context("failed to write credential file")?;

        tracing::debug!(path = %file.path().display(), "credentials written");
        Ok(Some(CredentialScope { file }))
    }
}

/// Removes the credential file when dropped.
#[derive(Debug)]
pub struct CredentialScope {
    file: NamedTempFile,
}

impl CredentialScope {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
