//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use lgtail::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Create a log directory with a small metadata dictionary
pub fn create_log_dir() -> TempDir {
    let temp = tempfile::tempdir().unwrap();
    Dictionary::write(
        temp.path().join("1Cv8.lgf"),
        &[
            MetadataEntry::new(1, "user", "Admin"),
            MetadataEntry::new(2, "computer", "srv-01"),
            MetadataEntry::new(3, "event", "Data.Update"),
        ],
    )
    .unwrap();
    temp
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

pub fn epoch(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn set_modified(path: &Path, modified: SystemTime) {
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

/// Write a complete part file whose payloads are `payloads`, then set its mtime
///
/// Staged under a temporary name so a live reader never sees a partial file.
pub fn write_part(dir: &Path, name: &str, payloads: &[&str], modified: SystemTime) -> PathBuf {
    let staging = dir.join(format!("{}.staging", name));
    let mut writer = PartFileWriter::create(&staging).unwrap();
    for (i, payload) in payloads.iter().enumerate() {
        writer
            .append(&PartRecord::new(
                ts(1_700_000_000 + i as i64),
                vec![1, 3],
                payload.as_bytes().to_vec(),
            ))
            .unwrap();
    }
    writer.finish().unwrap();
    set_modified(&staging, modified);

    let path = dir.join(name);
    std::fs::rename(&staging, &path).unwrap();
    path
}

pub fn payload(item: &EventLogItem) -> String {
    String::from_utf8_lossy(&item.payload).into_owned()
}

/// Read a batch session to the end
pub fn read_all(dir: &Path) -> Vec<EventLogItem> {
    let mut reader = FileEventLogReader::open(dir, TailConfig::batch()).unwrap();
    let cancel = CancellationToken::new();
    let mut items = Vec::new();
    loop {
        match reader.next(&cancel).unwrap() {
            ReadOutcome::Item(item) => items.push(item),
            ReadOutcome::EndOfStream => break,
            ReadOutcome::Cancelled => panic!("unexpected cancellation"),
        }
    }
    reader.close().unwrap();
    items
}
