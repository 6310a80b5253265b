//! Batch replay over real part files

mod common;

use common::*;
use lgtail::prelude::*;
use std::collections::HashMap;

#[test]
fn test_rotation_scenario() {
    let temp = create_log_dir();
    write_part(temp.path(), "part1.lgp", &["item1", "item2"], epoch(1_000));

    let mut reader = FileEventLogReader::open(temp.path(), TailConfig::batch()).unwrap();
    let cancel = CancellationToken::new();

    let first = reader.next(&cancel).unwrap().into_item().unwrap();
    let mut payloads = vec![payload(&first)];

    // part2 is created while part1 is still being read
    write_part(temp.path(), "part2.lgp", &["item3"], epoch(2_000));

    for _ in 0..2 {
        let item = reader.next(&cancel).unwrap().into_item().unwrap();
        payloads.push(payload(&item));
    }
    assert_eq!(payloads, vec!["item1", "item2", "item3"]);
    assert!(reader.active_path().unwrap().ends_with("part2.lgp"));
    assert!(reader.next(&cancel).unwrap().is_end_of_stream());
    assert!(reader.next(&cancel).unwrap().is_end_of_stream());
    reader.close().unwrap();
}

#[test]
fn test_items_follow_modification_order() {
    let temp = create_log_dir();
    // Names deliberately disagree with modification order
    write_part(temp.path(), "c.lgp", &["c0", "c1"], epoch(1_000));
    write_part(temp.path(), "a.lgp", &["a0", "a1", "a2"], epoch(3_000));
    write_part(temp.path(), "b.lgp", &["b0"], epoch(2_000));

    let modified: HashMap<_, _> = lgtail::list_part_files(temp.path(), "lgp")
        .unwrap()
        .into_iter()
        .map(|d| (d.path, d.modified))
        .collect();

    let items = read_all(temp.path());
    let keys: Vec<_> = items
        .iter()
        .map(|item| (modified[&item.source], item.index))
        .collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));

    let payloads: Vec<_> = items.iter().map(payload).collect();
    assert_eq!(payloads, vec!["c0", "c1", "b0", "a0", "a1", "a2"]);
}

#[test]
fn test_ends_after_total_item_count() {
    let temp = create_log_dir();
    let sizes = [4usize, 0, 7, 1];
    for (i, size) in sizes.iter().enumerate() {
        let payloads: Vec<String> = (0..*size).map(|n| format!("{}-{}", i, n)).collect();
        let refs: Vec<&str> = payloads.iter().map(String::as_str).collect();
        write_part(
            temp.path(),
            &format!("part{}.lgp", i),
            &refs,
            epoch(1_000 + i as u64),
        );
    }

    let items = read_all(temp.path());
    assert_eq!(items.len(), sizes.iter().sum::<usize>());
}

#[test]
fn test_fields_are_resolved_from_dictionary() {
    let temp = create_log_dir();
    write_part(temp.path(), "part1.lgp", &["x"], epoch(1_000));

    let items = read_all(temp.path());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].field("user"), Some("Admin"));
    assert_eq!(items[0].field("event"), Some("Data.Update"));
    assert_eq!(items[0].field("computer"), None);
    assert_eq!(items[0].timestamp, ts(1_700_000_000));
}

#[test]
fn test_empty_directory_ends_immediately() {
    let temp = create_log_dir();
    assert!(read_all(temp.path()).is_empty());
}

#[test]
fn test_missing_metadata_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    write_part(temp.path(), "part1.lgp", &["x"], epoch(1_000));

    let result = FileEventLogReader::open(temp.path(), TailConfig::batch());
    assert!(matches!(result, Err(TailError::Metadata(_))));
}

#[test]
fn test_custom_metadata_name_and_extension() {
    let temp = tempfile::tempdir().unwrap();
    Dictionary::write(
        temp.path().join("dict.json"),
        &[MetadataEntry::new(1, "user", "u"), MetadataEntry::new(3, "event", "e")],
    )
    .unwrap();
    write_part(temp.path(), "seg1.evp", &["x"], epoch(1_000));
    write_part(temp.path(), "ignored.lgp", &["y"], epoch(2_000));

    let config = TailConfig::batch()
        .with_metadata_file_name("dict.json")
        .with_part_extension("evp");
    let mut reader = FileEventLogReader::open(temp.path(), config).unwrap();
    let cancel = CancellationToken::new();

    let item = reader.next(&cancel).unwrap().into_item().unwrap();
    assert_eq!(payload(&item), "x");
    assert!(reader.next(&cancel).unwrap().is_end_of_stream());
}

#[test]
fn test_corrupt_part_is_skipped_by_default() {
    let temp = create_log_dir();
    write_part(temp.path(), "part1.lgp", &["a"], epoch(1_000));
    let bad = temp.path().join("part2.lgp");
    std::fs::write(&bad, b"garbage-header-bytes").unwrap();
    set_modified(&bad, epoch(2_000));
    write_part(temp.path(), "part3.lgp", &["c"], epoch(3_000));

    let payloads: Vec<_> = read_all(temp.path()).iter().map(payload).collect();
    assert_eq!(payloads, vec!["a", "c"]);
}

#[test]
fn test_corrupt_part_is_surfaced_when_configured() {
    let temp = create_log_dir();
    let bad = temp.path().join("part1.lgp");
    std::fs::write(&bad, b"garbage-header-bytes").unwrap();
    set_modified(&bad, epoch(1_000));
    write_part(temp.path(), "part2.lgp", &["b"], epoch(2_000));

    let config = TailConfig::batch().with_part_error_policy(PartErrorPolicy::Surface);
    let mut reader = FileEventLogReader::open(temp.path(), config).unwrap();
    let cancel = CancellationToken::new();

    match reader.next(&cancel) {
        Err(TailError::UnreadableSegment { path, .. }) => assert_eq!(path, bad),
        other => panic!("expected unreadable segment, got {:?}", other.map(|_| ())),
    }
    let item = reader.next(&cancel).unwrap().into_item().unwrap();
    assert_eq!(payload(&item), "b");
    assert!(reader.next(&cancel).unwrap().is_end_of_stream());
}

#[test]
fn test_double_close_and_drop() {
    let temp = create_log_dir();
    write_part(temp.path(), "part1.lgp", &["a", "b"], epoch(1_000));

    let mut reader = FileEventLogReader::open(temp.path(), TailConfig::batch()).unwrap();
    reader.next(&CancellationToken::new()).unwrap();
    reader.close().unwrap();
    reader.close().unwrap();
    assert!(reader.store().is_closed());
    drop(reader);
}
