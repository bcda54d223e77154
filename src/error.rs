//! Typed errors surfaced at the library-manager boundary.

use thiserror::Error;

/// Errors returned by [`LibraryManager`](crate::library::LibraryManager)
/// operations.
///
/// Validation variants are raised synchronously, before any storage I/O,
/// and leave no state change behind. `StoreUnavailable` means the blob
/// store rejected a write; the operation is treated as not having happened.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("not a valid absolute URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported file type: {0} (only application/pdf is accepted)")]
    UnsupportedFileType(String),

    #[error("group is full ({limit} sources max)")]
    LibraryFull { limit: usize },

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("no such group: {0}")]
    GroupNotFound(String),

    #[error("no such source: {0}")]
    SourceNotFound(String),

    #[error("storage unavailable")]
    StoreUnavailable(#[source] anyhow::Error),
}
