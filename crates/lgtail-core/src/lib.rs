//! lgtail Core: Traits and types for ordered consumption of rotated event logs
//!
//! An event log directory holds one metadata dictionary and any number of
//! part files. This crate defines the shared vocabulary used by the traversal
//! engine and by concrete file formats:
//! - Collaborator traits: [`MetadataStore`] and [`PartReader`]
//! - Cooperative cancellation: [`CancellationToken`] and [`WakeSignal`]
//! - Configuration: [`TailConfig`]
//! - Error type: [`TailError`]

pub mod cancel;
pub mod config;
pub mod error;
pub mod observe;
pub mod traits;
pub mod types;

pub use cancel::{CancellationToken, WakeReason, WakeSignal};
pub use config::{PartErrorPolicy, TailConfig};
pub use error::{Result, TailError};
pub use traits::{MetadataStore, PartReader};
pub use types::{MetadataEntry, Mode, PartFileDescriptor, ReadOutcome};
