//! Sequential cursor across part files
//!
//! Owns the single active part reader. Pulls records from it and, when it
//! runs dry, asks the [`Selector`] for a newer part file and swaps readers.
//! The old reader is always closed before the new one is opened, so at most
//! one part file is open at any instant.

use crate::selector::Selector;
use crate::tail::{TailController, WaitOutcome};
use lgtail_core::{
    cancel::CancellationToken,
    config::PartErrorPolicy,
    error::{Result, TailError},
    observe,
    traits::PartReader,
    types::{PartFileDescriptor, ReadOutcome},
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Delay between directory scan retries in batch mode
const SCAN_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// What one pull from the active reader produced
enum Fetch<T> {
    Item(T),

    /// No record available; the reader is done or absent
    Drained,

    /// A transient failure; the same reader is retried later
    Stalled,
}

/// Where the cursor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No part file has been opened yet
    NoReaderYet,

    /// Pulling records from the active reader
    Reading,

    /// The active reader ran dry and a newer part file is being looked for
    SwitchingFile,

    /// Batch mode reached the end of the log
    Exhausted,
}

pub struct SequentialCursor<R: PartReader> {
    selector: Selector,
    store: Arc<R::Store>,
    active: Option<R>,
    state: CursorState,
    policy: PartErrorPolicy,
    scan_retry_limit: u32,
    scan_failures: u32,
    parts_opened: usize,
}

impl<R: PartReader> SequentialCursor<R> {
    pub fn new(
        selector: Selector,
        store: Arc<R::Store>,
        policy: PartErrorPolicy,
        scan_retry_limit: u32,
    ) -> Self {
        Self {
            selector,
            store,
            active: None,
            state: CursorState::NoReaderYet,
            policy,
            scan_retry_limit,
            scan_failures: 0,
            parts_opened: 0,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Path of the part file currently open, if any
    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|r| r.path())
    }

    /// Number of part files opened during this session
    pub fn parts_opened(&self) -> usize {
        self.parts_opened
    }

    /// Produce the next item
    ///
    /// With `tail` set (live mode) the cursor never reports end of stream: it
    /// waits on the controller and re-scans instead. Without it (batch mode)
    /// it ends once no unread records and no newer part file remain.
    pub fn next(
        &mut self,
        cancel: &CancellationToken,
        mut tail: Option<&mut TailController>,
    ) -> Result<ReadOutcome<R::Item>> {
        if self.state == CursorState::Exhausted {
            return Ok(ReadOutcome::EndOfStream);
        }

        let live = tail.is_some();
        loop {
            if cancel.is_cancelled() {
                return Ok(ReadOutcome::Cancelled);
            }

            let stalled = match self.read_active(cancel, live)? {
                Fetch::Item(item) => {
                    self.state = CursorState::Reading;
                    observe::record_item();
                    return Ok(ReadOutcome::Item(item));
                }
                Fetch::Drained => false,
                Fetch::Stalled => true,
            };
            if cancel.is_cancelled() {
                return Ok(ReadOutcome::Cancelled);
            }

            // A stalled reader keeps its place; nothing newer may be read
            // before it is drained.
            if !stalled {
                if self.active.is_some() {
                    self.state = CursorState::SwitchingFile;
                }

                match self.selector.select_next() {
                    Ok(Some(next)) => {
                        self.scan_failures = 0;
                        // The new file is tried right away, without waiting
                        if self.switch_to(next, live)? {
                            continue;
                        }
                    }
                    Ok(None) => {
                        self.scan_failures = 0;
                    }
                    Err(e) => {
                        self.scan_failures += 1;
                        if !live && self.scan_failures > self.scan_retry_limit {
                            self.scan_failures = 0;
                            return Err(e);
                        }
                        tracing::warn!(
                            "Scan of {} failed (attempt {}): {}",
                            self.selector.dir().display(),
                            self.scan_failures,
                            e
                        );
                        if !live {
                            if cancel.sleep(SCAN_RETRY_BACKOFF) {
                                return Ok(ReadOutcome::Cancelled);
                            }
                            continue;
                        }
                    }
                }
            }

            // Caught up with the directory
            match tail.as_deref_mut() {
                Some(controller) => {
                    if controller.wait(cancel) == WaitOutcome::Cancelled {
                        return Ok(ReadOutcome::Cancelled);
                    }
                }
                None => {
                    tracing::debug!(
                        "Reached end of {} after {} part files",
                        self.selector.dir().display(),
                        self.parts_opened
                    );
                    self.close_active();
                    self.state = CursorState::Exhausted;
                    return Ok(ReadOutcome::EndOfStream);
                }
            }
        }
    }

    /// Pull one record from the active reader, applying the part error policy
    ///
    /// In live mode a transient I/O failure leaves the reader in place to be
    /// retried after the next wait.
    fn read_active(&mut self, cancel: &CancellationToken, live: bool) -> Result<Fetch<R::Item>> {
        let reader = match self.active.as_mut() {
            Some(reader) => reader,
            None => return Ok(Fetch::Drained),
        };

        match reader.read_next(cancel) {
            Ok(Some(item)) => Ok(Fetch::Item(item)),
            Ok(None) => Ok(Fetch::Drained),
            Err(e) if live && e.is_transient() => {
                tracing::warn!(
                    "Read of part file {} failed, retrying: {}",
                    reader.path().display(),
                    e
                );
                Ok(Fetch::Stalled)
            }
            Err(e) if e.is_segment_error() => {
                let path = reader.path().to_path_buf();
                // The file is left behind; selection continues after it
                self.close_active();
                self.handle_part_error(&path, e).map(|()| Fetch::Drained)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the active reader with one over `next`
    ///
    /// Returns `false` when the open failed transiently in live mode. The
    /// file then stays selectable and is tried again after the next wait.
    fn switch_to(&mut self, next: PartFileDescriptor, live: bool) -> Result<bool> {
        self.close_active();

        let path = next.path.clone();
        match R::open(&path, Arc::clone(&self.store)) {
            Ok(reader) => {
                tracing::info!("Reading part file {}", path.display());
                self.selector.advance(next);
                self.active = Some(reader);
                self.parts_opened += 1;
                self.state = CursorState::Reading;
                observe::record_part_switch();
                Ok(true)
            }
            Err(e) if live && e.is_transient() => {
                tracing::warn!("Cannot open part file {} yet: {}", path.display(), e);
                Ok(false)
            }
            Err(e) if e.is_segment_error() => {
                // Left behind for good
                self.selector.advance(next);
                self.handle_part_error(&path, e).map(|()| true)
            }
            Err(e) => Err(e),
        }
    }

    fn handle_part_error(&mut self, path: &Path, error: TailError) -> Result<()> {
        let error = match error {
            TailError::UnreadableSegment { .. } => error,
            other => TailError::unreadable(path, other),
        };
        match self.policy {
            PartErrorPolicy::Skip => {
                observe::record_part_error(false);
                tracing::warn!("Skipping part file {}: {}", path.display(), error);
                Ok(())
            }
            PartErrorPolicy::Surface => {
                observe::record_part_error(true);
                Err(error)
            }
        }
    }

    fn close_active(&mut self) {
        if let Some(reader) = self.active.take() {
            let path = reader.path().to_path_buf();
            if let Err(e) = reader.close() {
                tracing::warn!("Failed to close part file {}: {}", path.display(), e);
            }
        }
    }

    /// Release the active reader; safe to call repeatedly
    pub fn close(&mut self) {
        self.close_active();
    }
}
