//! Per-turn context assembly.
//!
//! Reconstructs the active group's sources into the exact argument set for
//! one generation request: URL descriptors pass through as plain URLs, file
//! descriptors are resolved back to full payloads from the blob store. This
//! is the only place persisted content re-enters a live request; it runs
//! once per chat turn and its cost is linear in the group size.

use tracing::debug;

use crate::models::{AssembledContext, Attachment, Group, SourceKind};
use crate::store::BlobStore;

/// Build the context payload for one chat turn.
///
/// `extra` holds this-turn-only attachments; they are always included,
/// ahead of anything resolved from the library. A file descriptor whose
/// blob is missing or unreadable is skipped with a debug log; a degraded
/// turn beats a failed one, so assembly itself never fails.
///
/// The attachment name comes from the descriptor title, not the stored
/// blob, so a rename propagates without rewriting the blob.
pub async fn assemble_context(
    group: &Group,
    extra: Vec<Attachment>,
    store: &dyn BlobStore,
) -> AssembledContext {
    let mut urls = Vec::new();
    let mut attachments = extra;

    for source in &group.sources {
        match source.kind {
            SourceKind::Url => {
                if let Some(url) = &source.url {
                    urls.push(url.clone());
                }
            }
            SourceKind::File => match store.get(&source.id).await {
                Ok(Some(blob)) => attachments.push(Attachment {
                    name: source.title.clone(),
                    mime_type: blob.mime_type,
                    data: blob.data,
                }),
                Ok(None) => {
                    debug!(id = %source.id, "dangling descriptor, blob missing, skipped");
                }
                Err(e) => {
                    debug!(id = %source.id, error = %e, "blob read failed, source skipped");
                }
            },
        }
    }

    AssembledContext { urls, attachments }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceDescriptor, StoredBlob};
    use crate::store::memory::InMemoryBlobStore;

    fn url_source(id: &str, url: &str) -> SourceDescriptor {
        SourceDescriptor {
            id: id.to_string(),
            kind: SourceKind::Url,
            title: url.to_string(),
            url: Some(url.to_string()),
            mime_type: None,
        }
    }

    fn file_source(id: &str, title: &str) -> SourceDescriptor {
        SourceDescriptor {
            id: id.to_string(),
            kind: SourceKind::File,
            title: title.to_string(),
            url: None,
            mime_type: Some("application/pdf".to_string()),
        }
    }

    fn group(sources: Vec<SourceDescriptor>) -> Group {
        Group {
            id: "default".to_string(),
            name: "Library".to_string(),
            sources,
        }
    }

    #[tokio::test]
    async fn test_url_and_file_sources_resolve() {
        let store = InMemoryBlobStore::new();
        store
            .put(&StoredBlob {
                id: "f1".to_string(),
                name: "reg.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                data: "JVBERi0=".to_string(),
                date: 1_700_000_000,
            })
            .await
            .unwrap();

        let group = group(vec![
            url_source("u1", "https://example.com/act.pdf"),
            file_source("f1", "Q3 regulations"),
        ]);

        let context = assemble_context(&group, Vec::new(), &store).await;

        assert_eq!(context.urls, vec!["https://example.com/act.pdf"]);
        assert_eq!(context.attachments.len(), 1);
        // Title override: the rename wins over the stored filename.
        assert_eq!(context.attachments[0].name, "Q3 regulations");
        assert_eq!(context.attachments[0].mime_type, "application/pdf");
        assert_eq!(context.attachments[0].data, "JVBERi0=");
    }

    #[tokio::test]
    async fn test_dangling_descriptor_is_skipped_silently() {
        let store = InMemoryBlobStore::new();
        let group = group(vec![
            url_source("u1", "https://example.com/act.pdf"),
            file_source("f1", "deleted out of band"),
        ]);

        let context = assemble_context(&group, Vec::new(), &store).await;

        assert_eq!(context.urls, vec!["https://example.com/act.pdf"]);
        assert!(context.attachments.is_empty());
    }

    #[tokio::test]
    async fn test_transient_attachments_come_first() {
        let store = InMemoryBlobStore::new();
        store
            .put(&StoredBlob {
                id: "f1".to_string(),
                name: "reg.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                data: "JVBERi0=".to_string(),
                date: 1_700_000_000,
            })
            .await
            .unwrap();

        let group = group(vec![file_source("f1", "reg.pdf")]);
        let extra = vec![Attachment {
            name: "this-turn.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            data: "AAAA".to_string(),
        }];

        let context = assemble_context(&group, extra, &store).await;

        assert_eq!(context.attachments.len(), 2);
        assert_eq!(context.attachments[0].name, "this-turn.pdf");
        assert_eq!(context.attachments[1].name, "reg.pdf");
    }

    #[tokio::test]
    async fn test_empty_group_yields_empty_context() {
        let store = InMemoryBlobStore::new();
        let context = assemble_context(&group(Vec::new()), Vec::new(), &store).await;

        assert!(context.urls.is_empty());
        assert!(context.attachments.is_empty());
    }
}
