//! Files command implementation

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use lgtail::TailConfig;
use std::path::PathBuf;

pub fn execute(dir: PathBuf, config: &TailConfig) -> Result<()> {
    let files = lgtail::list_part_files(&dir, &config.part_extension)
        .context("Failed to list part files")?;

    println!("\nPart Files");
    println!("{}", "=".repeat(60));
    println!("Path: {}", dir.display());

    if files.is_empty() {
        println!("\nNo part files found");
        return Ok(());
    }

    let mut total_bytes = 0u64;
    for (i, file) in files.iter().enumerate() {
        let size = std::fs::metadata(&file.path).map(|m| m.len()).unwrap_or(0);
        total_bytes += size;
        let modified: DateTime<Utc> = file.modified.into();
        println!(
            "{:>4}  {:<32} {:>12} bytes  {}",
            i + 1,
            file.file_name(),
            size,
            modified.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!("\n{} part files, {} bytes", files.len(), total_bytes);
    Ok(())
}
