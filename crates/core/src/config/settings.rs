//! Service settings from `.assess-kit/config.toml`.
//!
//! Every table and key is optional; a missing file yields
//! [`ServiceSettings::default`].
//!
//! # Example
//!
//! ```toml
//! credentials_env = "GCP_SERVICE_ACCOUNT_JSON"
//!
//! [stream]
//! poll_interval_ms = 2000
//! heartbeat_interval_ms = 30000
//! run_deadline_secs = 900
//!
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [evaluator]
//! command = "abcd-evaluator"
//! args = ["--json-lines"]
//! max_parallel_groups = 4
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings shared by every run the service performs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ServiceSettings {
    /// Environment variable holding the service-account JSON. When unset,
    /// runs proceed without a credential file.
    #[serde(default)]
    pub credentials_env: Option<String>,

    #[serde(default)]
    pub stream: StreamSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub evaluator: EvaluatorSettings,

    #[serde(default)]
    pub media: MediaSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

/// Cadence of the progress stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StreamSettings {
    /// How long the executor waits on a running stage before checking for
    /// progress.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum silence on the stream before a heartbeat is forced.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Wall-clock limit for a whole streaming run. `None` disables it.
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,

    /// Capacity of the completion channel between evaluators and the
    /// executor.
    #[serde(default = "default_completion_buffer")]
    pub completion_buffer: usize,
}

impl StreamSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            run_deadline_secs: None,
            completion_buffer: default_completion_buffer(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Ceiling for the non-streaming `/assess` endpoint.
    #[serde(default = "default_assess_timeout_secs")]
    pub assess_timeout_secs: u64,
}

impl ServerSettings {
    pub fn assess_timeout(&self) -> Duration {
        Duration::from_secs(self.assess_timeout_secs)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            assess_timeout_secs: default_assess_timeout_secs(),
        }
    }
}

/// External check evaluator. Without a command, the mock evaluator is used.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EvaluatorSettings {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Number of check groups evaluated concurrently within one stage.
    #[serde(default = "default_max_parallel_groups")]
    pub max_parallel_groups: usize,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            max_parallel_groups: default_max_parallel_groups(),
        }
    }
}

/// Media preparation commands. `{uri}` and `{workdir}` are substituted in
/// every argument. Unset commands turn the step into a no-op.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MediaSettings {
    #[serde(default)]
    pub annotate_command: Option<Vec<String>>,

    #[serde(default)]
    pub trim_command: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// Directory that receives `<dataset>/<table>.jsonl` result files.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_completion_buffer() -> usize {
    256
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_assess_timeout_secs() -> u64 {
    600
}

fn default_max_parallel_groups() -> usize {
    4
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".assess-kit/results")
}
