//! In-memory content-addressed blob store.
//!
//! Hashes are the SHA-256 hex digest of the payload, so uploading the same
//! bytes twice yields the same hash.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use satori_core::{BlobHash, TaskHandler};

use crate::error::{io_err, BlobError};
use crate::store::{checked_size, BlobStore};

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<BlobHash, Vec<u8>>>,
    uploads: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls so far.
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn contains(&self, hash: &BlobHash) -> bool {
        self.lock().contains_key(hash)
    }

    /// Payload stored under `hash`, if any.
    pub fn bytes(&self, hash: &BlobHash) -> Option<Vec<u8>> {
        self.lock().get(hash).cloned()
    }

    /// Store `bytes` directly; returns their hash.
    pub fn insert(&self, bytes: Vec<u8>) -> BlobHash {
        let hash = content_hash(&bytes);
        self.lock().insert(hash.clone(), bytes);
        hash
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<BlobHash, Vec<u8>>> {
        // A poisoned map is still a consistent map: every insert is a single call.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn put<H: TaskHandler>(&self, handler: &H, path: &Path) -> Result<BlobHash, BlobError> {
        checked_size(path)?;
        handler.log("Saving blob...");
        let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
        let hash = self.insert(bytes);
        self.uploads.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%hash, path = %path.display(), "blob stored in memory");
        Ok(hash)
    }

    fn get_to<H: TaskHandler>(
        &self,
        handler: &H,
        hash: &BlobHash,
        dest: &Path,
    ) -> Result<u64, BlobError> {
        handler.log("Loading blob...");
        let bytes = self
            .bytes(hash)
            .ok_or_else(|| BlobError::NotFound(hash.clone()))?;
        std::fs::write(dest, &bytes).map_err(|e| io_err(dest, e))?;
        Ok(bytes.len() as u64)
    }
}

fn content_hash(bytes: &[u8]) -> BlobHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    BlobHash(hex::encode(hasher.finalize()))
}
