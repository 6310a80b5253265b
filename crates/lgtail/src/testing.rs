//! In-memory doubles for the collaborator traits
//!
//! `MockReader` reads a plain-text part file, one item per line, and
//! re-reads the file on every call so appends become visible. A line starting
//! with `!` is a decode failure and a `#busy` line is a transient I/O failure
//! that leaves the reader in place. A file whose first line is `#locked`
//! cannot be opened. Open readers are counted per thread in [`OPEN_READERS`],
//! with the highest count seen by `open` kept in [`PEAK_OPEN_READERS`].

use lgtail_core::{
    cancel::CancellationToken,
    error::{Result, TailError},
    traits::{MetadataStore, PartReader},
    types::MetadataEntry,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

thread_local! {
    pub static OPEN_READERS: AtomicUsize = const { AtomicUsize::new(0) };
    pub static PEAK_OPEN_READERS: AtomicUsize = const { AtomicUsize::new(0) };
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<MetadataEntry>,
}

impl MetadataStore for MemoryStore {
    fn open(_path: &Path) -> Result<Self> {
        Ok(Self::default())
    }

    fn resolve(&self, reference: u64) -> Option<&MetadataEntry> {
        self.entries.iter().find(|e| e.reference == reference)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

pub struct MockReader {
    path: PathBuf,
    next_line: usize,
}

impl MockReader {
    fn label(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

impl PartReader for MockReader {
    type Store = MemoryStore;
    type Item = String;

    fn open(path: &Path, _store: Arc<MemoryStore>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.lines().next() == Some("#locked") {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked").into());
        }
        let open = OPEN_READERS.with(|c| c.fetch_add(1, Ordering::SeqCst)) + 1;
        PEAK_OPEN_READERS.with(|p| p.fetch_max(open, Ordering::SeqCst));
        Ok(Self {
            path: path.to_path_buf(),
            next_line: 0,
        })
    }

    fn read_next(&mut self, _cancel: &CancellationToken) -> Result<Option<String>> {
        let content = std::fs::read_to_string(&self.path)?;
        let line = match content.lines().nth(self.next_line) {
            Some(line) => line.to_string(),
            None => return Ok(None),
        };
        if line == "#busy" {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "busy").into());
        }
        if line.starts_with('!') {
            return Err(TailError::unreadable(&self.path, "corrupt line"));
        }
        self.next_line += 1;
        Ok(Some(format!("{}:{}", self.label(), line)))
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn close(self) -> Result<()> {
        OPEN_READERS.with(|c| c.fetch_sub(1, Ordering::SeqCst));
        Ok(())
    }
}

/// Write a text part file with the given lines and modification time
///
/// The file is staged under a temporary name and renamed into place so a
/// concurrent scan never sees it half-written.
pub fn write_part(dir: &Path, name: &str, lines: &[&str], modified_secs: u64) -> PathBuf {
    let staging = dir.join(format!("{}.staging", name));
    let path = dir.join(name);
    std::fs::write(&staging, lines.join("\n")).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&staging)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(modified_secs))
        .unwrap();
    std::fs::rename(&staging, &path).unwrap();
    path
}
