//! # satori-blob
//!
//! Content-addressed blob transfer.
//!
//! [`BlobClient`] talks to the blob server over HTTP(S):
//! `PUT /blob/upload` returns the server-computed hash,
//! `GET /blob/download/<hash>` returns the payload. Both carry the session
//! token as the `satori_token` cookie.
//!
//! The entity model only sees the [`BlobStore`] trait; [`MemoryBlobStore`]
//! implements it without a network for tests and offline editing.

pub mod client;
pub mod error;
pub mod memory;
pub mod store;
mod tls;

pub use client::BlobClient;
pub use error::BlobError;
pub use memory::MemoryBlobStore;
pub use store::{BlobStore, MAX_BLOB_SIZE};
