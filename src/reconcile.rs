//! Startup reconciliation between the metadata document and the blob store.
//!
//! The two stores fail independently (an interrupted save, a cleared
//! database, storage eviction), so they can diverge. This pass is the sole
//! recovery mechanism: every blob without a descriptor is adopted into the
//! default group. Dangling descriptors (blob missing) are left alone:
//! removing a record the user created is not a decision this pass may take;
//! context assembly skips them at read time instead.

use anyhow::Result;
use tracing::info;

use crate::models::{Group, SourceDescriptor, SourceKind};
use crate::store::BlobStore;

/// Id of the group seeded on first run. Orphaned blobs are adopted into the
/// first group, which on a fresh library is this one.
pub const DEFAULT_GROUP_ID: &str = "default";
pub const DEFAULT_GROUP_NAME: &str = "Library";

pub fn default_groups() -> Vec<Group> {
    vec![Group {
        id: DEFAULT_GROUP_ID.to_string(),
        name: DEFAULT_GROUP_NAME.to_string(),
        sources: Vec::new(),
    }]
}

/// Merge blob-store contents into `groups`, adopting orphans.
///
/// Seeds the default group when `groups` is empty, then synthesizes a file
/// descriptor for every blob whose id appears in no group. Returns the
/// number of descriptors synthesized; running the pass twice in a row
/// adopts nothing the second time. The caller persists the reconciled list
/// through the normal save path.
pub async fn reconcile_library(groups: &mut Vec<Group>, store: &dyn BlobStore) -> Result<usize> {
    if groups.is_empty() {
        *groups = default_groups();
    }

    let blobs = store.get_all().await?;

    let mut adopted = 0;
    for blob in blobs {
        let known = groups
            .iter()
            .any(|g| g.sources.iter().any(|s| s.id == blob.id));
        if known {
            continue;
        }

        groups[0].sources.push(SourceDescriptor {
            id: blob.id,
            kind: SourceKind::File,
            title: blob.name,
            url: None,
            mime_type: Some(blob.mime_type),
        });
        adopted += 1;
    }

    if adopted > 0 {
        info!(adopted, "adopted orphaned blobs into the default group");
    }

    Ok(adopted)
}
