use crate::error::{Result, TailError};
use crate::types::Mode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// What to do when a part file cannot be opened or decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartErrorPolicy {
    /// Log the failure, treat the file as exhausted and move on
    #[default]
    Skip,

    /// Return `TailError::UnreadableSegment` from `next()`; the following
    /// call continues with the next part file
    Surface,
}

/// Configuration for an event log reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailConfig {
    /// Batch replay or live tail
    /// Default: batch
    #[serde(default)]
    pub mode: Mode,

    /// How long to wait before re-scanning the directory when caught up (milliseconds)
    /// Default: 5000ms
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Name of the metadata dictionary inside the log directory
    /// Default: 1Cv8.lgf
    #[serde(default = "default_metadata_file_name")]
    pub metadata_file_name: String,

    /// Extension of part files (without the dot)
    /// Default: lgp
    #[serde(default = "default_part_extension")]
    pub part_extension: String,

    /// Watch the directory for created part files in live mode
    /// Default: true
    #[serde(default = "default_watch")]
    pub watch: bool,

    /// Default: skip
    #[serde(default)]
    pub on_part_error: PartErrorPolicy,

    /// Consecutive failed directory scans tolerated in batch mode
    /// Default: 3
    #[serde(default = "default_scan_retry_limit")]
    pub scan_retry_limit: u32,
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_metadata_file_name() -> String {
    "1Cv8.lgf".to_string()
}

fn default_part_extension() -> String {
    "lgp".to_string()
}

fn default_watch() -> bool {
    true
}

fn default_scan_retry_limit() -> u32 {
    3
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            poll_interval_ms: default_poll_interval_ms(),
            metadata_file_name: default_metadata_file_name(),
            part_extension: default_part_extension(),
            watch: default_watch(),
            on_part_error: PartErrorPolicy::default(),
            scan_retry_limit: default_scan_retry_limit(),
        }
    }
}

impl TailConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch() -> Self {
        Self::default()
    }

    pub fn live() -> Self {
        Self::default().with_mode(Mode::Live)
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_metadata_file_name(mut self, name: impl Into<String>) -> Self {
        self.metadata_file_name = name.into();
        self
    }

    pub fn with_part_extension(mut self, ext: impl Into<String>) -> Self {
        self.part_extension = ext.into();
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_part_error_policy(mut self, policy: PartErrorPolicy) -> Self {
        self.on_part_error = policy;
        self
    }

    pub fn with_scan_retry_limit(mut self, limit: u32) -> Self {
        self.scan_retry_limit = limit;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(TailError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.metadata_file_name.trim().is_empty() {
            return Err(TailError::Config(
                "metadata_file_name must not be empty".into(),
            ));
        }
        if self.part_extension.trim().is_empty() || self.part_extension.starts_with('.') {
            return Err(TailError::Config(format!(
                "invalid part_extension {:?}",
                self.part_extension
            )));
        }
        Ok(())
    }
}
