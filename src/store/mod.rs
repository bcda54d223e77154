//! Storage abstraction for full source records.
//!
//! The [`BlobStore`] trait covers the four operations the library needs
//! (upsert, point lookup, full scan, delete), enabling pluggable backends
//! (SQLite on disk, in-memory for tests and embedded hosts).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::StoredBlob;

/// Abstract store of [`StoredBlob`] records keyed by source id.
///
/// All operations are async (via `async-trait`). A returned error means the
/// store was unavailable or a transaction aborted; callers treat that as
/// non-fatal to the broader application and degrade rather than crash.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put`](BlobStore::put) | Insert or replace a record by id |
/// | [`get`](BlobStore::get) | Point lookup; absence is not an error |
/// | [`get_all`](BlobStore::get_all) | Every record, order unspecified |
/// | [`delete`](BlobStore::delete) | Remove by id; absent keys succeed |
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Insert or replace the record stored under `blob.id`.
    ///
    /// Atomic per record: a concurrent reader observes either the previous
    /// record or the new one, never a half-written row.
    async fn put(&self, blob: &StoredBlob) -> Result<()>;

    /// Retrieve the record stored under `id`, if any.
    async fn get(&self, id: &str) -> Result<Option<StoredBlob>>;

    /// Retrieve every stored record. No ordering guarantee.
    async fn get_all(&self) -> Result<Vec<StoredBlob>>;

    /// Delete the record stored under `id`. Deleting an absent key
    /// succeeds silently.
    async fn delete(&self, id: &str) -> Result<()>;
}
