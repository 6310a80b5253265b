//! Live tail controller
//!
//! Keeps a live session from terminating when it catches up with the
//! directory. Two triggers feed one [`WakeSignal`]:
//! - the poll interval, which alone guarantees forward progress
//! - a directory watcher that fires on part file creation and only shortens
//!   the current wait
//!
//! The watcher callback runs on the watcher's own thread and never touches
//! cursor state; it only notifies the signal.

use crate::selector::has_extension;
use lgtail_core::{
    cancel::{CancellationToken, WakeReason, WakeSignal},
    error::{Result, TailError},
    observe,
};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The poll interval elapsed
    TimedOut,

    /// A part file creation was observed (or a hint was already pending)
    Hinted,

    Cancelled,
}

pub struct TailController {
    dir: PathBuf,
    extension: String,
    poll_interval: Duration,
    watch: bool,
    signal: Arc<WakeSignal>,
    watcher: Option<RecommendedWatcher>,
    started: bool,
}

impl TailController {
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: impl Into<String>,
        poll_interval: Duration,
        watch: bool,
    ) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            poll_interval,
            watch,
            signal: Arc::new(WakeSignal::new()),
            watcher: None,
            started: false,
        }
    }

    /// Whether a directory watcher is currently registered
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Signal shared with the watcher, exposed so callers can deliver their own hints
    pub fn wake_signal(&self) -> Arc<WakeSignal> {
        Arc::clone(&self.signal)
    }

    /// Start the directory watcher on first use
    ///
    /// A watcher that cannot be started is logged and the controller keeps
    /// working on the poll interval alone.
    pub fn ensure_started(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if !self.watch {
            tracing::debug!(
                "Directory watch disabled, polling {} every {:?}",
                self.dir.display(),
                self.poll_interval
            );
            return;
        }

        match start_watcher(&self.dir, &self.extension, Arc::clone(&self.signal)) {
            Ok(watcher) => {
                tracing::debug!("Watching {} for new part files", self.dir.display());
                self.watcher = Some(watcher);
            }
            Err(e) => {
                tracing::warn!(
                    "Falling back to polling every {:?}: {}",
                    self.poll_interval,
                    e
                );
            }
        }
    }

    /// Block until the poll interval elapses, a hint arrives, or `cancel` fires
    pub fn wait(&mut self, cancel: &CancellationToken) -> WaitOutcome {
        self.ensure_started();

        let _registration = cancel.register(&self.signal);
        if cancel.is_cancelled() {
            observe::record_poll_wait("cancel");
            return WaitOutcome::Cancelled;
        }

        let reason = self.signal.wait_timeout(self.poll_interval);
        if cancel.is_cancelled() {
            observe::record_poll_wait("cancel");
            return WaitOutcome::Cancelled;
        }

        match reason {
            WakeReason::Notified => {
                tracing::debug!("Woken early by part file hint");
                observe::record_poll_wait("hint");
                WaitOutcome::Hinted
            }
            WakeReason::TimedOut => {
                observe::record_poll_wait("timeout");
                WaitOutcome::TimedOut
            }
        }
    }

    /// Unregister the directory watcher; safe to call repeatedly
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Err(e) = watcher.unwatch(&self.dir) {
                tracing::debug!("Failed to unwatch {}: {}", self.dir.display(), e);
            }
            tracing::debug!("Stopped watching {}", self.dir.display());
        }
        self.signal.clear();
    }
}

impl Drop for TailController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn is_creation(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

fn start_watcher(dir: &Path, extension: &str, signal: Arc<WakeSignal>) -> Result<RecommendedWatcher> {
    let extension = extension.to_string();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if is_creation(&event.kind)
                && event.paths.iter().any(|p| has_extension(p, &extension))
            {
                signal.notify();
            }
        }
        Err(e) => tracing::warn!("Part file watcher error: {}", e),
    })
    .map_err(|e| TailError::Watch(e.to_string()))?;

    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| TailError::Watch(format!("{}: {}", dir.display(), e)))?;
    Ok(watcher)
}
