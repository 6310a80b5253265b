use crate::dictionary::Dictionary;
use chrono::{DateTime, Utc};
use lgtail_core::{
    cancel::CancellationToken,
    error::{Result, TailError},
    traits::{MetadataStore, PartReader},
    types::MetadataEntry,
};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Magic bytes at the start of every part file
pub const PART_MAGIC: &[u8; 8] = b"LGPART01";

/// Largest record body accepted by the reader (bytes)
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// timestamp (8) + reference count (2)
const RECORD_FIXED_SIZE: usize = 10;

/// One entry of the event log, with its references resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLogItem {
    /// Part file the item was read from
    pub source: PathBuf,

    /// 0-based position of the record inside its part file
    pub index: u64,

    pub timestamp: DateTime<Utc>,

    /// Dictionary entries referenced by the record, in record order
    pub fields: Vec<MetadataEntry>,

    pub payload: Vec<u8>,
}

impl EventLogItem {
    /// First resolved field of the given kind
    pub fn field(&self, kind: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.value.as_str())
    }
}

/// A record as written to disk, before reference resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    pub timestamp: DateTime<Utc>,
    pub references: Vec<u64>,
    pub payload: Vec<u8>,
}

impl PartRecord {
    pub fn new(timestamp: DateTime<Utc>, references: Vec<u64>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp,
            references,
            payload: payload.into(),
        }
    }

    /// Append the framed record to `buf`
    ///
    /// Format: [len: u32][timestamp_ms: i64][ref_count: u16][refs: u64 * n][payload],
    /// all integers big-endian, `len` covering everything after itself.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        if self.references.len() > u16::MAX as usize {
            return Err(TailError::Config(format!(
                "Record has {} references, limit is {}",
                self.references.len(),
                u16::MAX
            )));
        }

        let body_len = RECORD_FIXED_SIZE + self.references.len() * 8 + self.payload.len();
        if body_len > MAX_RECORD_SIZE {
            return Err(TailError::Config(format!(
                "Record size {} exceeds max record size {}",
                body_len, MAX_RECORD_SIZE
            )));
        }

        buf.reserve(4 + body_len);
        buf.extend_from_slice(&(body_len as u32).to_be_bytes());
        buf.extend_from_slice(&self.timestamp.timestamp_millis().to_be_bytes());
        buf.extend_from_slice(&(self.references.len() as u16).to_be_bytes());
        for reference in &self.references {
            buf.extend_from_slice(&reference.to_be_bytes());
        }
        buf.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// Appends records to a part file
pub struct PartFileWriter {
    writer: BufWriter<File>,
    records_written: u64,
}

impl PartFileWriter {
    /// Create a new part file (truncating any existing one) and write the header
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(PART_MAGIC)?;
        writer.flush()?;

        Ok(Self {
            writer,
            records_written: 0,
        })
    }

    /// Reopen an existing part file to append more records
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            records_written: 0,
        })
    }

    /// Number of records appended through this writer
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Append one record and flush it to the OS
    pub fn append(&mut self, record: &PartRecord) -> Result<()> {
        let mut buf = Vec::new();
        record.encode_into(&mut buf)?;
        self.writer.write_all(&buf)?;
        self.writer.flush()?;
        self.records_written += 1;
        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Flush and close, returning the number of records written
    pub fn finish(mut self) -> Result<u64> {
        self.sync()?;
        Ok(self.records_written)
    }
}

/// Reader over a single `.lgp` part file
///
/// Tolerates a writer that is still appending: an incomplete header or a
/// truncated trailing record reads as "no more records for now", and the
/// next call picks up from the same offset.
pub struct PartFileReader {
    path: PathBuf,
    reader: BufReader<File>,
    store: Arc<Dictionary>,
    header_checked: bool,
    offset: u64,
    next_index: u64,
}

impl PartFileReader {
    /// Byte offset of the next unread record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records read so far
    pub fn records_read(&self) -> u64 {
        self.next_index
    }

    /// Fill `buf` completely, or report `false` if the file ends first
    fn read_full(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => return Ok(false),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    /// Rewind to the start of the record being read
    fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(self.offset))?;
        Ok(())
    }

    fn check_header(&mut self) -> Result<bool> {
        let mut magic = [0u8; 8];
        if !self.read_full(&mut magic)? {
            self.rewind()?;
            return Ok(false);
        }
        if &magic != PART_MAGIC {
            return Err(TailError::unreadable(&self.path, "bad part file header"));
        }
        self.offset = PART_MAGIC.len() as u64;
        self.header_checked = true;
        Ok(true)
    }

    fn read_record(&mut self) -> Result<Option<EventLogItem>> {
        if !self.header_checked && !self.check_header()? {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        if !self.read_full(&mut len_bytes)? {
            self.rewind()?;
            return Ok(None);
        }

        let body_len = u32::from_be_bytes(len_bytes) as usize;
        if body_len < RECORD_FIXED_SIZE || body_len > MAX_RECORD_SIZE {
            return Err(TailError::unreadable(
                &self.path,
                format!(
                    "record {} at offset {} has invalid length {}",
                    self.next_index, self.offset, body_len
                ),
            ));
        }

        let mut body = vec![0u8; body_len];
        if !self.read_full(&mut body)? {
            // Writer is mid-append; retry this record on the next call
            self.rewind()?;
            return Ok(None);
        }

        let item = self.decode(&body)?;
        self.offset += 4 + body_len as u64;
        self.next_index += 1;
        Ok(Some(item))
    }

    fn decode(&self, body: &[u8]) -> Result<EventLogItem> {
        let ts_millis = i64::from_be_bytes(body[0..8].try_into().expect("slice of 8 bytes"));
        let ref_count = u16::from_be_bytes(body[8..10].try_into().expect("slice of 2 bytes")) as usize;

        let refs_end = RECORD_FIXED_SIZE + ref_count * 8;
        if refs_end > body.len() {
            return Err(TailError::unreadable(
                &self.path,
                format!(
                    "record {} declares {} references but is only {} bytes",
                    self.next_index,
                    ref_count,
                    body.len()
                ),
            ));
        }

        let timestamp = DateTime::<Utc>::from_timestamp_millis(ts_millis).ok_or_else(|| {
            TailError::unreadable(
                &self.path,
                format!("record {} has invalid timestamp {}", self.next_index, ts_millis),
            )
        })?;

        let mut fields = Vec::with_capacity(ref_count);
        for chunk in body[RECORD_FIXED_SIZE..refs_end].chunks_exact(8) {
            let reference = u64::from_be_bytes(chunk.try_into().expect("chunk of 8 bytes"));
            let entry = self.store.resolve(reference).ok_or_else(|| {
                TailError::unreadable(
                    &self.path,
                    format!("record {} has unknown reference {}", self.next_index, reference),
                )
            })?;
            fields.push(entry.clone());
        }

        Ok(EventLogItem {
            source: self.path.clone(),
            index: self.next_index,
            timestamp,
            fields,
            payload: body[refs_end..].to_vec(),
        })
    }
}

impl PartReader for PartFileReader {
    type Store = Dictionary;
    type Item = EventLogItem;

    fn open(path: &Path, store: Arc<Dictionary>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            store,
            header_checked: false,
            offset: 0,
            next_index: 0,
        })
    }

    fn read_next(&mut self, cancel: &CancellationToken) -> Result<Option<EventLogItem>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }

        match self.read_record() {
            Err(e @ TailError::Io(_)) => {
                // A retry starts over at the same record
                if let Err(seek) = self.rewind() {
                    tracing::debug!("Failed to rewind {}: {}", self.path.display(), seek);
                }
                Err(e)
            }
            other => other,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn close(self) -> Result<()> {
        tracing::trace!(
            "Closed part file {} after {} records",
            self.path.display(),
            self.next_index
        );
        Ok(())
    }
}
