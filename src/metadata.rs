//! Synchronous metadata store: one JSON document holding the group list.
//!
//! The whole document is rewritten on every save (no partial updates), so
//! callers must always operate on the latest in-memory snapshot. The store
//! is not safe for overlapping writers; the library assumes one active
//! session at a time.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::Group;

/// On-disk layout of the metadata document.
#[derive(Debug, Deserialize)]
struct LibraryDocument {
    groups: Vec<Group>,
}

/// Single-document JSON store at a fixed path.
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored group list. A missing document is `None`, not an
    /// error; a present-but-malformed document is an error.
    pub fn load(&self) -> Result<Option<Vec<Group>>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to read metadata document: {}", self.path.display())
                })
            }
        };

        let doc: LibraryDocument = serde_json::from_str(&raw)
            .with_context(|| format!("malformed metadata document: {}", self.path.display()))?;
        Ok(Some(doc.groups))
    }

    /// Replace the stored document with `groups`.
    ///
    /// Writes a sibling temp file and renames it over the target, so an
    /// interrupted save leaves the previous document intact rather than a
    /// truncated one.
    pub fn save(&self, groups: &[Group]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw = serde_json::to_string(&serde_json::json!({ "groups": groups }))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .with_context(|| format!("failed to write metadata document: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| {
            format!("failed to replace metadata document: {}", self.path.display())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceDescriptor, SourceKind};
    use tempfile::TempDir;

    fn sample_groups() -> Vec<Group> {
        vec![Group {
            id: "default".to_string(),
            name: "Library".to_string(),
            sources: vec![SourceDescriptor {
                id: "s1".to_string(),
                kind: SourceKind::Url,
                title: "https://example.com/a".to_string(),
                url: Some("https://example.com/a".to_string()),
                mime_type: None,
            }],
        }]
    }

    #[test]
    fn test_missing_document_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new(tmp.path().join("library.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new(tmp.path().join("library.json"));

        store.save(&sample_groups()).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "default");
        assert_eq!(loaded[0].sources.len(), 1);
        assert_eq!(loaded[0].sources[0].kind, SourceKind::Url);
        assert_eq!(
            loaded[0].sources[0].url.as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn test_save_replaces_whole_document() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::new(tmp.path().join("library.json"));

        store.save(&sample_groups()).unwrap();
        store
            .save(&[Group {
                id: "default".to_string(),
                name: "Library".to_string(),
                sources: Vec::new(),
            }])
            .unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert!(loaded[0].sources.is_empty());
    }

    #[test]
    fn test_malformed_document_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("library.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = MetadataStore::new(path);
        assert!(store.load().is_err());
    }
}
