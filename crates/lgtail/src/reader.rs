//! Event log reader: the public entry point and owner of every resource
//!
//! An [`EventLogReader`] opens the metadata store once, drives a
//! [`SequentialCursor`] over the part files and, in live mode, a
//! [`TailController`]. The directory watch and the first part reader are
//! created lazily on the first call to `next`. `close` releases the watch,
//! the active part reader and the metadata store, in that order, exactly
//! once; it also runs on drop.

use crate::cursor::{CursorState, SequentialCursor};
use crate::selector::Selector;
use crate::tail::TailController;
use lgtail_core::{
    cancel::CancellationToken,
    config::TailConfig,
    error::{Result, TailError},
    traits::{MetadataStore, PartReader},
    types::ReadOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct EventLogReader<R: PartReader> {
    dir: PathBuf,
    store: Arc<R::Store>,
    cursor: SequentialCursor<R>,
    tail: Option<TailController>,
    closed: bool,
}

impl<R: PartReader> EventLogReader<R> {
    /// Open the log directory at `dir`
    ///
    /// Fails if the directory is missing or unreadable, if the config is
    /// invalid, or if the metadata store cannot be loaded.
    pub fn open(dir: impl AsRef<Path>, config: TailConfig) -> Result<Self> {
        config.validate()?;
        let dir = dir.as_ref().to_path_buf();
        check_directory(&dir)?;

        let store = Arc::new(R::Store::open(&dir.join(&config.metadata_file_name))?);

        let cursor = SequentialCursor::new(
            Selector::new(&dir, &config.part_extension),
            Arc::clone(&store),
            config.on_part_error,
            config.scan_retry_limit,
        );
        let tail = config.mode.is_live().then(|| {
            TailController::new(
                &dir,
                &config.part_extension,
                config.poll_interval(),
                config.watch,
            )
        });

        tracing::info!(
            "Opened event log {} ({:?} mode, {} metadata entries)",
            dir.display(),
            config.mode,
            store.len()
        );

        Ok(Self {
            dir,
            store,
            cursor,
            tail,
            closed: false,
        })
    }

    /// Block until the next item is available
    ///
    /// Batch mode returns [`ReadOutcome::EndOfStream`] once everything on disk
    /// has been read. Live mode only returns without an item when `cancel`
    /// fires.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self, cancel: &CancellationToken) -> Result<ReadOutcome<R::Item>> {
        if self.closed {
            return Err(TailError::Closed);
        }
        self.cursor.next(cancel, self.tail.as_mut())
    }

    /// Release the directory watch, the active part reader and the metadata store
    ///
    /// Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(tail) = self.tail.as_mut() {
            tail.stop();
        }
        self.cursor.close();
        self.store.close()?;

        tracing::info!("Closed event log {}", self.dir.display());
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The metadata store shared by every part reader of this session
    pub fn store(&self) -> &R::Store {
        &self.store
    }

    pub fn cursor_state(&self) -> CursorState {
        self.cursor.state()
    }

    /// Path of the part file currently open, if any
    pub fn active_path(&self) -> Option<&Path> {
        self.cursor.active_path()
    }

    /// Whether the live-mode directory watch is registered
    pub fn is_watching(&self) -> bool {
        self.tail.as_ref().map(|t| t.is_watching()).unwrap_or(false)
    }
}

impl<R: PartReader> Drop for EventLogReader<R> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close event log {}: {}", self.dir.display(), e);
        }
    }
}

fn check_directory(dir: &Path) -> Result<()> {
    let unavailable = |reason: String| TailError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(dir).map_err(|e| unavailable(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(unavailable("not a directory".into()));
    }
    std::fs::read_dir(dir).map_err(|e| unavailable(e.to_string()))?;
    Ok(())
}
