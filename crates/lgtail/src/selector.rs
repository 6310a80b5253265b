//! Part file selection
//!
//! Part files are visited oldest first. The position of a session is the
//! `(modified, file name)` pair of the current part file, re-read from the
//! filesystem at every decision; the next file is the smallest pair strictly
//! above it. Files sharing a modification time are therefore visited in
//! file-name order. Rotation is one-way: the current file and every file
//! already left behind are never selected again, even if their modification
//! time changes later.

use lgtail_core::{
    error::{Result, TailError},
    observe,
    types::PartFileDescriptor,
};
use std::collections::HashSet;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

/// List the part files of `dir`, ordered the way a session visits them
pub fn list_part_files(dir: &Path, extension: &str) -> Result<Vec<PartFileDescriptor>> {
    let start = Instant::now();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| TailError::Scan(format!("Failed to list {}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| TailError::Scan(format!("Failed to list {}: {}", dir.display(), e)))?;
        let path = entry.path();
        if !has_extension(&path, extension) {
            continue;
        }

        // The file may vanish between listing and stat
        let modified = match regular_file_modified(entry.metadata()) {
            Ok(Some(modified)) => modified,
            Ok(None) => continue,
            Err(e) => {
                tracing::trace!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        files.push(PartFileDescriptor::new(path, modified));
    }

    files.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    observe::record_scan(start.elapsed());
    Ok(files)
}

/// Modification time of a regular file, `None` for anything else
fn regular_file_modified(metadata: io::Result<Metadata>) -> io::Result<Option<SystemTime>> {
    let metadata = metadata?;
    if !metadata.is_file() {
        return Ok(None);
    }
    metadata.modified().map(Some)
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Decides which part file becomes active next
#[derive(Debug)]
pub struct Selector {
    dir: PathBuf,
    extension: String,
    current: Option<PartFileDescriptor>,
    consumed: HashSet<PathBuf>,
}

impl Selector {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            current: None,
            consumed: HashSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of part files left behind so far
    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    /// Find the part file that should follow the current one
    ///
    /// Returns `None` when the directory is caught up.
    pub fn select_next(&self) -> Result<Option<PartFileDescriptor>> {
        let files = list_part_files(&self.dir, &self.extension)?;
        let watermark = self.current.as_ref().map(|current| {
            // Prefer the live modification time of the current file; fall
            // back to the one seen at selection if it has been removed.
            files
                .iter()
                .find(|f| f.path == current.path)
                .unwrap_or(current)
                .clone()
        });

        Ok(select_after(files, watermark.as_ref(), |path| {
            self.consumed.contains(path)
        }))
    }

    /// Make `next` the current part file, retiring the previous one
    pub fn advance(&mut self, next: PartFileDescriptor) {
        if let Some(previous) = self.current.replace(next) {
            self.consumed.insert(previous.path);
        }
    }
}

/// Pick the first file of `files` (already sorted) strictly after `watermark`
fn select_after(
    files: Vec<PartFileDescriptor>,
    watermark: Option<&PartFileDescriptor>,
    is_consumed: impl Fn(&Path) -> bool,
) -> Option<PartFileDescriptor> {
    files.into_iter().find(|f| {
        if is_consumed(&f.path) {
            return false;
        }
        match watermark {
            Some(w) => f.path != w.path && f.sort_key() > w.sort_key(),
            None => true,
        }
    })
}
