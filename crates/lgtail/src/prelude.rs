//! lgtail Prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use lgtail::prelude::*;
//! ```

// Core types
pub use crate::{Mode, ReadOutcome, Result, TailError};

// Configs
pub use crate::{PartErrorPolicy, TailConfig};

// Traits
pub use crate::{MetadataStore, PartReader};

// Cancellation
pub use crate::CancellationToken;

// Readers
pub use crate::{EventLogReader, FileEventLogReader};

// File formats
pub use crate::{Dictionary, EventLogItem, MetadataEntry, PartFileWriter, PartRecord};
