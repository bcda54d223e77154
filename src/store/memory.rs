//! In-memory [`BlobStore`] implementation for testing and hosts without a
//! filesystem.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`; every operation completes
//! immediately.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::StoredBlob;

use super::BlobStore;

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, blob: &StoredBlob) -> Result<()> {
        self.blobs
            .write()
            .unwrap()
            .insert(blob.id.clone(), blob.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredBlob>> {
        Ok(self.blobs.read().unwrap().get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<StoredBlob>> {
        Ok(self.blobs.read().unwrap().values().cloned().collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.blobs.write().unwrap().remove(id);
        Ok(())
    }
}
