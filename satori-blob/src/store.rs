//! The seam between entities and blob storage.

use std::path::Path;

use satori_core::{BlobHash, TaskHandler};

use crate::error::{io_err, BlobError};

/// Largest payload a single upload may carry: the byte count must fit a
/// signed 32-bit length.
pub const MAX_BLOB_SIZE: u64 = i32::MAX as u64;

/// Upload / download of content-addressed payloads.
///
/// Implementations are called from inside a task's `execute` scope and may
/// log progress through the handler.
pub trait BlobStore {
    /// Store the file at `path`; returns the content hash.
    fn put<H: TaskHandler>(&self, handler: &H, path: &Path) -> Result<BlobHash, BlobError>;

    /// Write the payload stored under `hash` to `dest`; returns bytes written.
    fn get_to<H: TaskHandler>(
        &self,
        handler: &H,
        hash: &BlobHash,
        dest: &Path,
    ) -> Result<u64, BlobError>;
}

/// Size of `path`, rejecting files over [`MAX_BLOB_SIZE`].
pub(crate) fn checked_size(path: &Path) -> Result<u64, BlobError> {
    let meta = std::fs::metadata(path).map_err(|e| io_err(path, e))?;
    let size = meta.len();
    if size > MAX_BLOB_SIZE {
        return Err(BlobError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_BLOB_SIZE,
        });
    }
    Ok(size)
}

/// Hashes go into URL paths verbatim, so only plain tokens are accepted.
pub(crate) fn validate_hash(hash: &BlobHash) -> Result<(), BlobError> {
    let ok = !hash.0.is_empty()
        && hash
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(BlobError::InvalidHash(hash.0.clone()))
    }
}
