//! Read command implementation

use anyhow::{Context, Result};
use futures::StreamExt;
use lgtail::prelude::*;
use std::path::PathBuf;

/// Layer command-line flags over the loaded config
pub fn apply_flags(
    mut config: TailConfig,
    live: bool,
    poll_interval_ms: Option<u64>,
    no_watch: bool,
) -> TailConfig {
    if live {
        config = config.with_mode(Mode::Live);
    }
    if let Some(ms) = poll_interval_ms {
        config = config.with_poll_interval_ms(ms);
    }
    if no_watch {
        config = config.with_watch(false);
    }
    config
}

pub async fn execute(dir: PathBuf, config: TailConfig, json: bool) -> Result<()> {
    tracing::info!("Reading event log: {}", dir.display());

    let reader = FileEventLogReader::open(&dir, config).context("Failed to open event log")?;
    let cancel = CancellationToken::new();

    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
            on_interrupt.cancel();
        }
    });

    let mut items = Box::pin(lgtail::item_stream(reader, cancel));
    let mut count = 0u64;
    let mut errors = 0u64;

    while let Some(result) = items.next().await {
        match result {
            Ok(item) => {
                println!("{}", format_item(&item, json)?);
                count += 1;
            }
            Err(e @ TailError::UnreadableSegment { .. }) => {
                eprintln!("Skipped segment: {}", e);
                errors += 1;
            }
            Err(e) => return Err(e).context("Failed to read event log"),
        }
    }

    eprintln!("{} entries read, {} unreadable segments", count, errors);
    Ok(())
}

fn format_item(item: &EventLogItem, json: bool) -> Result<String> {
    let source = item
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let payload = String::from_utf8_lossy(&item.payload);

    if json {
        let fields: serde_json::Map<String, serde_json::Value> = item
            .fields
            .iter()
            .map(|f| (f.kind.clone(), serde_json::Value::String(f.value.clone())))
            .collect();
        let value = serde_json::json!({
            "timestamp": item.timestamp.to_rfc3339(),
            "source": source,
            "index": item.index,
            "fields": fields,
            "payload": payload,
        });
        Ok(serde_json::to_string(&value)?)
    } else {
        let fields = item
            .fields
            .iter()
            .map(|f| format!("{}={}", f.kind, f.value))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(format!(
            "{} {}#{} {} {}",
            item.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            source,
            item.index,
            fields,
            payload
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn item() -> EventLogItem {
        EventLogItem {
            source: PathBuf::from("/logs/part1.lgp"),
            index: 3,
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            fields: vec![MetadataEntry::new(1, "user", "Admin")],
            payload: b"hello".to_vec(),
        }
    }

    #[test]
    fn test_apply_flags() {
        let config = apply_flags(TailConfig::default(), true, Some(250), true);
        assert_eq!(config.mode, Mode::Live);
        assert_eq!(config.poll_interval_ms, 250);
        assert!(!config.watch);

        let untouched = apply_flags(TailConfig::default(), false, None, false);
        assert_eq!(untouched, TailConfig::default());
    }

    #[test]
    fn test_format_text() {
        let line = format_item(&item(), false).unwrap();
        assert_eq!(line, "2023-11-14 22:13:20.000 part1.lgp#3 user=Admin hello");
    }

    #[test]
    fn test_format_json() {
        let line = format_item(&item(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["source"], "part1.lgp");
        assert_eq!(value["index"], 3);
        assert_eq!(value["fields"]["user"], "Admin");
        assert_eq!(value["payload"], "hello");
    }
}
