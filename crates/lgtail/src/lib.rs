//! lgtail: ordered, resumable consumption of rotated event logs
//!
//! An event log directory holds one metadata dictionary and a growing set of
//! part files. lgtail turns that directory into a single linear stream of
//! entries:
//! - **Batch mode**: replay everything currently on disk, then end
//! - **Live mode**: keep waiting for new records and new part files, like the
//!   source stage of a log shipper
//!
//! # Quick Start
//!
//! ```no_run
//! use lgtail::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let mut reader = FileEventLogReader::open("/var/log/app", TailConfig::batch())?;
//! let cancel = CancellationToken::new();
//!
//! while let ReadOutcome::Item(item) = reader.next(&cancel)? {
//!     println!("{} {}", item.timestamp, String::from_utf8_lossy(&item.payload));
//! }
//! reader.close()?;
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod prelude;
pub mod reader;
pub mod selector;
pub mod stream;
pub mod tail;

#[cfg(test)]
mod testing;

pub use lgtail_core::{
    cancel::{CancellationToken, WakeReason, WakeSignal},
    config::{PartErrorPolicy, TailConfig},
    error::{Result, TailError},
    traits::{MetadataStore, PartReader},
    types::{MetadataEntry, Mode, PartFileDescriptor, ReadOutcome},
};
pub use lgtail_format::{
    Dictionary, EventLogItem, PartFileReader, PartFileWriter, PartRecord,
};

pub use cursor::{CursorState, SequentialCursor};
pub use reader::EventLogReader;
pub use selector::{list_part_files, Selector};
pub use stream::item_stream;
pub use tail::{TailController, WaitOutcome};

/// Reader over the `.lgf` / `.lgp` file formats
pub type FileEventLogReader = EventLogReader<PartFileReader>;
