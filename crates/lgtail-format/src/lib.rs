//! File formats of an lgtail event log directory
//!
//! A log directory contains:
//! - One metadata dictionary (`1Cv8.lgf` by default): a JSON document mapping
//!   compact numeric references to `(kind, value)` pairs
//! - Any number of part files (`*.lgp`): an 8-byte magic header followed by
//!   length-prefixed records, each carrying a timestamp, a list of dictionary
//!   references and an opaque payload
//!
//! Part files are written by a single appender and may be read while they
//! are still growing.

mod dictionary;
mod part;

pub use dictionary::{Dictionary, DICTIONARY_VERSION};
pub use part::{
    EventLogItem, PartFileReader, PartFileWriter, PartRecord, MAX_RECORD_SIZE, PART_MAGIC,
};
