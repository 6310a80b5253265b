use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::SystemTime;

/// Consumption mode, fixed for the lifetime of a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Replay everything currently on disk, then end the stream
    #[default]
    Batch,

    /// Wait for new records and part files, never ending on its own
    Live,
}

impl Mode {
    pub fn is_live(self) -> bool {
        matches!(self, Mode::Live)
    }
}

/// A part file as seen at one selection decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFileDescriptor {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl PartFileDescriptor {
    pub fn new(path: PathBuf, modified: SystemTime) -> Self {
        Self { path, modified }
    }

    /// File name for display; non-UTF-8 names are converted lossily
    pub fn file_name(&self) -> Cow<'_, str> {
        self.raw_file_name().to_string_lossy()
    }

    fn raw_file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or(self.path.as_os_str())
    }

    /// Ordering key: modification time first, then the raw file name
    pub fn sort_key(&self) -> (SystemTime, &OsStr) {
        (self.modified, self.raw_file_name())
    }
}

/// Entry of the shared metadata dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Compact reference used inside part file records
    pub reference: u64,

    /// Category of the value (user, computer, event, ...)
    pub kind: String,

    pub value: String,
}

impl MetadataEntry {
    pub fn new(reference: u64, kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            reference,
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Result of asking a reader for its next item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    Item(T),

    /// Batch mode only: every record present on disk has been read
    EndOfStream,

    /// The cancellation token fired before an item became available
    Cancelled,
}

impl<T> ReadOutcome<T> {
    pub fn into_item(self) -> Option<T> {
        match self {
            ReadOutcome::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadOutcome::EndOfStream)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReadOutcome::Cancelled)
    }
}
