//! Collaborator traits
//!
//! The traversal engine never parses files itself. It talks to a metadata
//! store (opened once per log directory) and to part readers (one per part
//! file, at most one open at a time) through these traits.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::types::MetadataEntry;
use std::path::Path;
use std::sync::Arc;

/// Shared dictionary resolving compact references used inside part records
///
/// Read-only after `open`, so a single instance is shared by every part
/// reader of a session behind an `Arc`.
pub trait MetadataStore: Send + Sync + Sized {
    /// Load the dictionary from `path`
    fn open(path: &Path) -> Result<Self>;

    /// Look up a reference
    fn resolve(&self, reference: u64) -> Option<&MetadataEntry>;

    /// Number of entries loaded
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release any resources held by the store
    ///
    /// Must be idempotent.
    fn close(&self) -> Result<()>;
}

/// Stateful cursor over exactly one part file
pub trait PartReader: Sized {
    type Store: MetadataStore;
    type Item;

    /// Open a reader over `path`, keeping a handle to the shared store
    fn open(path: &Path, store: Arc<Self::Store>) -> Result<Self>;

    /// Read the next record in file order
    ///
    /// `Ok(None)` means the file is exhausted *for now*: a later call may
    /// return more records if a writer keeps appending to it.
    fn read_next(&mut self, cancel: &CancellationToken) -> Result<Option<Self::Item>>;

    /// Path of the part file this reader is bound to
    fn path(&self) -> &Path;

    /// Release the file handle
    fn close(self) -> Result<()>;
}
