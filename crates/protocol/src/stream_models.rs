//! Progress stream protocol.
//!
//! A run is reported to the client as newline-delimited JSON records, each
//! carrying a `status` field:
//!
//! ```json
//! {"status":"processing","step":"Evaluating Shorts features","progress":"5/12"}
//! {"status":"complete","result":{"brand_name":"Acme","video_uri":"gs://b/v.mp4"}}
//! {"status":"error","error":"Creative provider GCS does not match video URI"}
//! ```
//!
//! Exactly one `complete` or `error` record ends a run. Clients must treat a
//! stream that closes without a `complete` record as failed.

use crate::assessment_models::Assessment;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use ts_rs::TS;

/// A `completed/total` pair, rendered on the wire as the string `"5/12"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
}

impl Progress {
    pub fn new(completed: u64, total: u64) -> Self {
        Self { completed, total }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

impl Serialize for Progress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Progress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let (completed, total) = s
            .split_once('/')
            .ok_or_else(|| de::Error::custom(format!("expected <completed>/<total>, got {s}")))?;
        let completed = completed.trim().parse().map_err(de::Error::custom)?;
        let total = total.trim().parse().map_err(de::Error::custom)?;
        Ok(Progress { completed, total })
    }
}

/// One record of the progress stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Work is ongoing. Also sent as a heartbeat with unchanged progress.
    Processing {
        step: String,
        #[ts(type = "string")]
        progress: Progress,
    },

    /// The run finished; carries the assembled assessment.
    Complete { result: Assessment },

    /// The run failed. No partial result accompanies an error.
    Error { error: String },
}

impl StreamEvent {
    pub fn processing(step: impl Into<String>, progress: Progress) -> Self {
        Self::Processing {
            step: step.into(),
            progress,
        }
    }

    pub fn error(message: impl fmt::Display) -> Self {
        Self::Error {
            error: message.to_string(),
        }
    }

    /// `complete` and `error` end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    /// Serialize as a single NDJSON line, including the trailing newline.
    pub fn to_ndjson_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
