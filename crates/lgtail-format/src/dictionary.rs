use lgtail_core::{
    error::{Result, TailError},
    traits::MetadataStore,
    types::MetadataEntry,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Current on-disk version of the dictionary document
pub const DICTIONARY_VERSION: u32 = 1;

/// On-disk layout of the `.lgf` file
#[derive(Debug, Serialize, Deserialize)]
struct DictionaryFile {
    version: u32,
    #[serde(default)]
    entries: Vec<MetadataEntry>,
}

/// Metadata dictionary shared by every part reader of a session
#[derive(Debug)]
pub struct Dictionary {
    path: PathBuf,
    entries: HashMap<u64, MetadataEntry>,
    closed: AtomicBool,
}

impl Dictionary {
    /// Write a dictionary document to `path`, replacing any existing file
    pub fn write(path: impl AsRef<Path>, entries: &[MetadataEntry]) -> Result<()> {
        let doc = DictionaryFile {
            version: DICTIONARY_VERSION,
            entries: entries.to_vec(),
        };
        let data = serde_json::to_string_pretty(&doc)?;
        std::fs::write(path.as_ref(), data)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn from_document(path: &Path, doc: DictionaryFile) -> Result<Self> {
        if doc.version != DICTIONARY_VERSION {
            return Err(TailError::Metadata(format!(
                "{}: unsupported dictionary version {}",
                path.display(),
                doc.version
            )));
        }

        let mut entries = HashMap::with_capacity(doc.entries.len());
        for entry in doc.entries {
            let reference = entry.reference;
            if entries.insert(reference, entry).is_some() {
                return Err(TailError::Metadata(format!(
                    "{}: duplicate reference {}",
                    path.display(),
                    reference
                )));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            closed: AtomicBool::new(false),
        })
    }
}

impl MetadataStore for Dictionary {
    fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            TailError::Metadata(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let doc: DictionaryFile = serde_json::from_str(&data).map_err(|e| {
            TailError::Metadata(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let dictionary = Self::from_document(path, doc)?;
        tracing::debug!(
            "Loaded metadata dictionary {} ({} entries)",
            path.display(),
            dictionary.len()
        );
        Ok(dictionary)
    }

    fn resolve(&self, reference: u64) -> Option<&MetadataEntry> {
        self.entries.get(&reference)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Closed metadata dictionary {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_open() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("1Cv8.lgf");
        Dictionary::write(
            &path,
            &[
                MetadataEntry::new(1, "user", "Admin"),
                MetadataEntry::new(2, "computer", "srv-01"),
            ],
        )
        .unwrap();

        let dict = Dictionary::open(&path).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.resolve(1).unwrap().value, "Admin");
        assert_eq!(dict.resolve(2).unwrap().kind, "computer");
        assert!(dict.resolve(3).is_none());
    }

    #[test]
    fn test_missing_file_is_metadata_error() {
        let temp = TempDir::new().unwrap();
        let err = Dictionary::open(&temp.path().join("missing.lgf")).unwrap_err();
        assert!(matches!(err, TailError::Metadata(_)));
    }

    #[test]
    fn test_corrupt_file_is_metadata_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("1Cv8.lgf");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Dictionary::open(&path),
            Err(TailError::Metadata(_))
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_unknown_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("1Cv8.lgf");

        std::fs::write(
            &path,
            r#"{"version":1,"entries":[
                {"reference":1,"kind":"user","value":"a"},
                {"reference":1,"kind":"user","value":"b"}]}"#,
        )
        .unwrap();
        let err = Dictionary::open(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate reference 1"));

        std::fs::write(&path, r#"{"version":9,"entries":[]}"#).unwrap();
        let err = Dictionary::open(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported dictionary version 9"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("1Cv8.lgf");
        Dictionary::write(&path, &[]).unwrap();

        let dict = Dictionary::open(&path).unwrap();
        assert!(dict.is_empty());
        dict.close().unwrap();
        dict.close().unwrap();
        assert!(dict.is_closed());
    }
}
