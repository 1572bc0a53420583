//! Error types for satori-model.

use std::path::PathBuf;

use thiserror::Error;

use satori_blob::BlobError;
use satori_core::{RecordId, TaskCancelled};

/// Failures reported by a [`crate::RecordService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: RecordId },

    /// The service refused the write (stale revision, constraint, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// All errors an entity operation can surface.
///
/// None of these leave the entity changed: local state only moves after the
/// remote work has returned successfully.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("record service error: {0}")]
    Service(#[from] ServiceError),

    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    #[error(transparent)]
    Cancelled(#[from] TaskCancelled),

    #[error("field '{0}' does not hold a blob")]
    NotABlob(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    /// True when the task was cancelled, whichever layer noticed it.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled(_) | Self::Blob(BlobError::Cancelled(_))
        )
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ModelError {
    ModelError::Io {
        path: path.into(),
        source,
    }
}
