use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Log directory unavailable: {path}: {reason}")]
    DirectoryUnavailable { path: PathBuf, reason: String },

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Unreadable segment {path}: {reason}")]
    UnreadableSegment { path: PathBuf, reason: String },

    #[error("Directory scan failed: {0}")]
    Scan(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reader is closed")]
    Closed,

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl TailError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::UnreadableSegment {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error only affects a single part file.
    ///
    /// Segment errors are subject to the configured part error policy;
    /// everything else is propagated to the caller.
    pub fn is_segment_error(&self) -> bool {
        matches!(self, TailError::UnreadableSegment { .. } | TailError::Io(_))
    }

    /// Whether retrying the same part file later may succeed
    ///
    /// I/O failures other than a missing file (a writer holding a lock, too
    /// many open files) are transient; decode failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, TailError::Io(e) if e.kind() != io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, TailError>;
