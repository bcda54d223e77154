//! Core data models for the source library.
//!
//! These types cover the two persisted shapes (source descriptors inside the
//! metadata document, full blobs in the blob store) and the transient context
//! payload assembled for each chat turn.

use serde::{Deserialize, Serialize};

/// Discriminates the two kinds of knowledge source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Url,
    File,
}

/// Lightweight record describing one knowledge source.
///
/// Lives inside a [`Group`] in the metadata document. Never carries the
/// binary payload; file content is stored separately under the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Opaque unique id, immutable, unique across the whole library.
    pub id: String,
    pub kind: SourceKind,
    /// User-visible label. Defaults to the URL string or original filename.
    pub title: String,
    /// Present iff `kind == Url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Present iff `kind == File`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Named, ordered collection of sources. One group is always active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub sources: Vec<SourceDescriptor>,
}

/// Full source record held in the blob store.
///
/// `id` equals the id of the owning [`SourceDescriptor`]. The pairing is a
/// soft foreign key: the two stores fail independently and are never updated
/// in one transaction. A blob with no descriptor is an orphan (adopted at
/// startup); a file descriptor with no blob is dangling (skipped at read
/// time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub id: String,
    /// Original filename at upload time.
    pub name: String,
    pub mime_type: String,
    /// Payload bytes, base64 (standard alphabet).
    pub data: String,
    /// Creation time, Unix seconds.
    pub date: i64,
}

/// A resolved file payload handed to the generation backend.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub data: String,
}

/// The exact argument set for one generation request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssembledContext {
    pub urls: Vec<String>,
    pub attachments: Vec<Attachment>,
}
