//! Error types for satori-blob.

use std::path::PathBuf;

use thiserror::Error;

use satori_core::{BlobHash, TaskCancelled};

/// All errors that can arise from blob transfers.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The local file exceeds what a single upload can carry. Raised before
    /// any network I/O.
    #[error("cannot handle blobs bigger than {limit}B: {path} is {size}B")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Local file I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The server answered with a non-success status.
    #[error("blob request failed: {code} {reason}")]
    Status { code: u16, reason: String },

    /// Connection, DNS, or TLS handshake failure.
    #[error("blob transport error: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    /// Reading the response body failed mid-stream.
    #[error("failed to read blob response: {0}")]
    Read(#[source] std::io::Error),

    /// The TLS client configuration could not be built.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    /// A hash that cannot be placed in a download path.
    #[error("invalid blob hash '{0}'")]
    InvalidHash(String),

    /// The upload succeeded but the server returned no hash.
    #[error("blob server returned an empty hash")]
    EmptyHash,

    /// The store has no payload under this hash.
    #[error("blob not found: {0}")]
    NotFound(BlobHash),

    #[error(transparent)]
    Cancelled(#[from] TaskCancelled),
}

/// Convenience constructor for [`BlobError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BlobError {
    BlobError::Io {
        path: path.into(),
        source,
    }
}

impl From<ureq::Error> for BlobError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => BlobError::Status {
                code,
                reason: response.status_text().to_string(),
            },
            ureq::Error::Transport(transport) => BlobError::Transport(Box::new(transport)),
        }
    }
}
