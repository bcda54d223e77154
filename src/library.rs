//! Library mutation surface.
//!
//! Every change to the group list funnels through [`LibraryManager`]; the
//! metadata document is re-persisted after each mutation. Mutations are
//! immediate and optimistic; there is no pending/confirmed distinction.
//! Within one operation the blob store is mutated strictly before the
//! metadata save (additions) and blob deletion is attempted before
//! descriptor removal (deletions), so a crash mid-operation leaves at worst
//! an orphan blob, never a descriptor pointing at content that was never
//! written.
//!
//! The manager assumes operations are issued serially by a single session;
//! there is no cross-operation locking (known limitation, not enforced).

use std::sync::Arc;

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::error::LibraryError;
use crate::metadata::MetadataStore;
use crate::models::{Group, SourceDescriptor, SourceKind, StoredBlob};
use crate::reconcile;
use crate::store::BlobStore;

/// The only MIME type accepted by [`LibraryManager::add_file_source`].
pub const SUPPORTED_UPLOAD_MIME: &str = "application/pdf";

/// Owner of the in-memory group list and the single mutation funnel.
pub struct LibraryManager {
    groups: Vec<Group>,
    active_group_id: String,
    max_sources_per_group: usize,
    store: Arc<dyn BlobStore>,
    metadata: MetadataStore,
}

impl LibraryManager {
    /// Load the persisted library, reconcile it against the blob store,
    /// and persist the reconciled state.
    ///
    /// A missing metadata document seeds one default, empty group. If the
    /// blob store cannot be read the reconciliation pass is skipped with a
    /// logged warning; the library still opens with whatever the metadata
    /// document holds.
    pub async fn open(
        metadata: MetadataStore,
        store: Arc<dyn BlobStore>,
        max_sources_per_group: usize,
    ) -> Result<Self> {
        let mut groups = metadata.load()?.unwrap_or_default();
        if groups.is_empty() {
            groups = reconcile::default_groups();
        }

        if let Err(e) = reconcile::reconcile_library(&mut groups, store.as_ref()).await {
            warn!(error = %e, "blob store unreachable, skipping reconciliation");
        }

        let active_group_id = groups[0].id.clone();
        let manager = Self {
            groups,
            active_group_id,
            max_sources_per_group,
            store,
            metadata,
        };
        manager.persist();
        Ok(manager)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// The group whose sources feed context assembly.
    pub fn active_group(&self) -> &Group {
        self.groups
            .iter()
            .find(|g| g.id == self.active_group_id)
            .unwrap_or(&self.groups[0])
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Look a descriptor up anywhere in the library.
    pub fn find_source(&self, id: &str) -> Option<&SourceDescriptor> {
        self.groups
            .iter()
            .flat_map(|g| g.sources.iter())
            .find(|s| s.id == id)
    }

    /// Add a remote URL source to `group_id`.
    ///
    /// The URL must parse as an absolute URL; the group must exist and be
    /// under the capacity limit. The new descriptor's title defaults to the
    /// URL string itself.
    pub fn add_url_source(
        &mut self,
        group_id: &str,
        url: &str,
    ) -> Result<SourceDescriptor, LibraryError> {
        if Url::parse(url).is_err() {
            return Err(LibraryError::InvalidUrl(url.to_string()));
        }

        let limit = self.max_sources_per_group;
        let group = self.group_mut(group_id)?;
        if group.sources.len() >= limit {
            return Err(LibraryError::LibraryFull { limit });
        }

        let descriptor = SourceDescriptor {
            id: Uuid::new_v4().to_string(),
            kind: SourceKind::Url,
            title: url.to_string(),
            url: Some(url.to_string()),
            mime_type: None,
        };
        group.sources.push(descriptor.clone());
        self.persist();
        Ok(descriptor)
    }

    /// Add an uploaded document to `group_id`.
    ///
    /// Validation (media type, capacity) happens before any store I/O. The
    /// blob is written first; the descriptor is appended only once the
    /// write has succeeded, so this path never creates a descriptor whose
    /// content is missing.
    pub async fn add_file_source(
        &mut self,
        group_id: &str,
        name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<SourceDescriptor, LibraryError> {
        if mime_type != SUPPORTED_UPLOAD_MIME {
            return Err(LibraryError::UnsupportedFileType(mime_type.to_string()));
        }

        let limit = self.max_sources_per_group;
        {
            let group = self.group_mut(group_id)?;
            if group.sources.len() >= limit {
                return Err(LibraryError::LibraryFull { limit });
            }
        }

        let id = Uuid::new_v4().to_string();
        let blob = StoredBlob {
            id: id.clone(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            data: STANDARD.encode(bytes),
            date: Utc::now().timestamp(),
        };
        self.store
            .put(&blob)
            .await
            .map_err(LibraryError::StoreUnavailable)?;

        let descriptor = SourceDescriptor {
            id,
            kind: SourceKind::File,
            title: name.to_string(),
            url: None,
            mime_type: Some(mime_type.to_string()),
        };
        self.group_mut(group_id)?.sources.push(descriptor.clone());
        self.persist();
        Ok(descriptor)
    }

    /// Remove a source anywhere in the library by id.
    ///
    /// Descriptor ids are unique across the whole library, so removal is
    /// global, not group-scoped. For file sources the blob is deleted
    /// first; a failed delete is logged and the descriptor removed anyway,
    /// trading a possible orphan blob (repaired at next startup) for a
    /// library that always reflects the user's action. Unknown ids are a
    /// no-op, which makes the operation idempotent.
    pub async fn remove_source(&mut self, id: &str) -> Result<(), LibraryError> {
        let Some(descriptor) = self.find_source(id).cloned() else {
            return Ok(());
        };

        if descriptor.kind == SourceKind::File {
            if let Err(e) = self.store.delete(id).await {
                warn!(id, error = %e, "blob delete failed, removing descriptor anyway");
            }
        }

        for group in &mut self.groups {
            group.sources.retain(|s| s.id != id);
        }
        self.persist();
        Ok(())
    }

    /// Change a source's user-visible title.
    ///
    /// Empty and whitespace-only titles are rejected with no state change.
    /// The stored blob, if any, keeps its original name; the new title is
    /// applied at assembly time instead.
    pub fn rename_source(&mut self, id: &str, new_title: &str) -> Result<(), LibraryError> {
        if new_title.trim().is_empty() {
            return Err(LibraryError::EmptyTitle);
        }

        let descriptor = self
            .groups
            .iter_mut()
            .flat_map(|g| g.sources.iter_mut())
            .find(|s| s.id == id)
            .ok_or_else(|| LibraryError::SourceNotFound(id.to_string()))?;

        descriptor.title = new_title.to_string();
        self.persist();
        Ok(())
    }

    /// Select which group's sources feed context assembly. Pure selection;
    /// nothing is persisted.
    pub fn set_active_group(&mut self, group_id: &str) -> Result<(), LibraryError> {
        if !self.groups.iter().any(|g| g.id == group_id) {
            return Err(LibraryError::GroupNotFound(group_id.to_string()));
        }
        self.active_group_id = group_id.to_string();
        Ok(())
    }

    fn group_mut(&mut self, group_id: &str) -> Result<&mut Group, LibraryError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| LibraryError::GroupNotFound(group_id.to_string()))
    }

    /// Re-save the metadata document. Failures are logged, not propagated;
    /// the in-memory state stays authoritative for the session and the
    /// next successful mutation rewrites the full document anyway.
    fn persist(&self) {
        if let Err(e) = self.metadata.save(&self.groups) {
            warn!(error = %e, "failed to persist library metadata");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::DEFAULT_GROUP_ID;
    use crate::store::memory::InMemoryBlobStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Blob store whose writes always fail, for the no-dangling guarantee.
    struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn put(&self, _blob: &StoredBlob) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
        async fn get(&self, _id: &str) -> Result<Option<StoredBlob>> {
            Err(anyhow!("disk on fire"))
        }
        async fn get_all(&self) -> Result<Vec<StoredBlob>> {
            Err(anyhow!("disk on fire"))
        }
        async fn delete(&self, _id: &str) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    async fn open_manager(tmp: &TempDir, store: Arc<dyn BlobStore>, limit: usize) -> LibraryManager {
        let metadata = MetadataStore::new(tmp.path().join("library.json"));
        LibraryManager::open(metadata, store, limit).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_seeds_default_group() {
        let tmp = TempDir::new().unwrap();
        let manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 50).await;

        assert_eq!(manager.groups().len(), 1);
        assert_eq!(manager.active_group().id, DEFAULT_GROUP_ID);
        // The seeded state is persisted immediately.
        assert!(tmp.path().join("library.json").exists());
    }

    #[tokio::test]
    async fn test_open_survives_unreachable_blob_store() {
        let tmp = TempDir::new().unwrap();
        let manager = open_manager(&tmp, Arc::new(FailingBlobStore), 50).await;

        assert_eq!(manager.groups().len(), 1);
    }

    #[tokio::test]
    async fn test_add_url_source() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 50).await;

        let descriptor = manager
            .add_url_source(DEFAULT_GROUP_ID, "https://example.com/act.pdf")
            .unwrap();

        assert_eq!(descriptor.kind, SourceKind::Url);
        assert_eq!(descriptor.title, "https://example.com/act.pdf");
        assert_eq!(descriptor.url.as_deref(), Some("https://example.com/act.pdf"));
        assert!(descriptor.mime_type.is_none());
        assert_eq!(manager.active_group().sources.len(), 1);
    }

    #[tokio::test]
    async fn test_add_url_source_rejects_invalid_url() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 50).await;

        for bad in ["", "not a url", "example.com/missing-scheme", "/relative"] {
            let err = manager.add_url_source(DEFAULT_GROUP_ID, bad).unwrap_err();
            assert!(matches!(err, LibraryError::InvalidUrl(_)), "{bad:?}");
        }
        assert!(manager.active_group().sources.is_empty());
    }

    #[tokio::test]
    async fn test_add_url_source_rejects_unknown_group() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 50).await;

        let err = manager
            .add_url_source("nope", "https://example.com")
            .unwrap_err();
        assert!(matches!(err, LibraryError::GroupNotFound(_)));
    }

    #[tokio::test]
    async fn test_capacity_limit_is_enforced_at_add_time() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 2).await;

        manager
            .add_url_source(DEFAULT_GROUP_ID, "https://example.com/a")
            .unwrap();
        manager
            .add_url_source(DEFAULT_GROUP_ID, "https://example.com/b")
            .unwrap();
        let err = manager
            .add_url_source(DEFAULT_GROUP_ID, "https://example.com/c")
            .unwrap_err();

        assert!(matches!(err, LibraryError::LibraryFull { limit: 2 }));
        assert_eq!(manager.active_group().sources.len(), 2);
    }

    #[tokio::test]
    async fn test_add_file_source_writes_blob_then_descriptor() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryBlobStore::new());
        let mut manager = open_manager(&tmp, store.clone(), 50).await;

        let descriptor = manager
            .add_file_source(DEFAULT_GROUP_ID, "reg.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(descriptor.kind, SourceKind::File);
        assert_eq!(descriptor.title, "reg.pdf");
        assert_eq!(descriptor.mime_type.as_deref(), Some("application/pdf"));

        let blob = store.get(&descriptor.id).await.unwrap().unwrap();
        assert_eq!(blob.name, "reg.pdf");
        assert_eq!(blob.data, STANDARD.encode(b"%PDF-1.4"));
    }

    #[tokio::test]
    async fn test_add_file_source_rejects_non_pdf_before_store_io() {
        let tmp = TempDir::new().unwrap();
        // A failing store proves validation happens before any I/O.
        let mut manager = open_manager(&tmp, Arc::new(FailingBlobStore), 50).await;

        let err = manager
            .add_file_source(DEFAULT_GROUP_ID, "notes.txt", "text/plain", b"hi")
            .await
            .unwrap_err();

        assert!(matches!(err, LibraryError::UnsupportedFileType(_)));
        assert!(manager.active_group().sources.is_empty());
    }

    #[tokio::test]
    async fn test_failed_blob_write_leaves_no_descriptor() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(FailingBlobStore), 50).await;

        let err = manager
            .add_file_source(DEFAULT_GROUP_ID, "reg.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap_err();

        assert!(matches!(err, LibraryError::StoreUnavailable(_)));
        assert!(manager.active_group().sources.is_empty());
    }

    #[tokio::test]
    async fn test_remove_source_deletes_blob_and_descriptor() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryBlobStore::new());
        let mut manager = open_manager(&tmp, store.clone(), 50).await;

        let descriptor = manager
            .add_file_source(DEFAULT_GROUP_ID, "reg.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();
        manager.remove_source(&descriptor.id).await.unwrap();

        assert!(manager.find_source(&descriptor.id).is_none());
        assert!(store.get(&descriptor.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_source_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 50).await;

        let descriptor = manager
            .add_url_source(DEFAULT_GROUP_ID, "https://example.com/a")
            .unwrap();

        manager.remove_source(&descriptor.id).await.unwrap();
        manager.remove_source(&descriptor.id).await.unwrap();

        assert!(manager.active_group().sources.is_empty());
    }

    #[tokio::test]
    async fn test_rename_source_round_trip_leaves_blob_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(InMemoryBlobStore::new());
        let mut manager = open_manager(&tmp, store.clone(), 50).await;

        let descriptor = manager
            .add_file_source(DEFAULT_GROUP_ID, "reg.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();
        manager
            .rename_source(&descriptor.id, "Q3 regulations")
            .unwrap();

        assert_eq!(
            manager.find_source(&descriptor.id).unwrap().title,
            "Q3 regulations"
        );
        let blob = store.get(&descriptor.id).await.unwrap().unwrap();
        assert_eq!(blob.name, "reg.pdf");
    }

    #[tokio::test]
    async fn test_rename_source_rejects_blank_titles() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 50).await;

        let descriptor = manager
            .add_url_source(DEFAULT_GROUP_ID, "https://example.com/a")
            .unwrap();

        for blank in ["", "   ", "\t\n"] {
            let err = manager.rename_source(&descriptor.id, blank).unwrap_err();
            assert!(matches!(err, LibraryError::EmptyTitle));
        }
        assert_eq!(
            manager.find_source(&descriptor.id).unwrap().title,
            "https://example.com/a"
        );
    }

    #[tokio::test]
    async fn test_set_active_group() {
        let tmp = TempDir::new().unwrap();
        let mut manager = open_manager(&tmp, Arc::new(InMemoryBlobStore::new()), 50).await;

        assert!(matches!(
            manager.set_active_group("nope"),
            Err(LibraryError::GroupNotFound(_))
        ));
        manager.set_active_group(DEFAULT_GROUP_ID).unwrap();
        assert_eq!(manager.active_group().id, DEFAULT_GROUP_ID);
    }
}
