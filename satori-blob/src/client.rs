//! HTTP(S) blob client.
//!
//! ## Upload
//!
//! 1. Check the file size against [`crate::MAX_BLOB_SIZE`] (no network yet).
//! 2. `PUT /blob/upload` with `Filename: <name>`, a fixed `Content-Length`
//!    and the `satori_token` cookie; the body streams from the file.
//! 3. Non-2xx → [`BlobError::Status`]; otherwise the body is the hash.
//!
//! ## Download
//!
//! `GET /blob/download/<hash>` with the same cookie. The stream variant hands
//! the response body to the caller unbuffered.
//!
//! Nothing here retries. The session token is sent as configured and never
//! refreshed.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use satori_core::{BlobHash, ClientConfig, TaskHandler};

use crate::error::{io_err, BlobError};
use crate::store::{checked_size, validate_hash, BlobStore};
use crate::tls;

const UPLOAD_PATH: &str = "/blob/upload";
const DOWNLOAD_PATH: &str = "/blob/download/";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blob transfer client. Cheap to clone; holds no per-transfer state.
#[derive(Clone)]
pub struct BlobClient {
    agent: ureq::Agent,
    base_url: String,
    cookie: String,
}

impl std::fmt::Debug for BlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BlobClient {
    /// Client for the blob endpoint described by `config`, authenticating
    /// with `token`.
    pub fn new(config: &ClientConfig, token: &str) -> Result<Self, BlobError> {
        let mut builder = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .user_agent(concat!("satori-blob/", env!("CARGO_PKG_VERSION")));
        if config.use_ssl {
            builder = builder.tls_config(Arc::new(tls::insecure_client_config()?));
        }
        Ok(Self {
            agent: builder.build(),
            base_url: config.blob_base_url(),
            cookie: format!("satori_token={token}"),
        })
    }

    /// Client using the token stored in `config` (empty if none).
    pub fn from_config(config: &ClientConfig) -> Result<Self, BlobError> {
        Self::new(config, config.token.as_deref().unwrap_or_default())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload the file at `path`; returns the server-assigned hash.
    pub fn put_blob<H: TaskHandler>(&self, handler: &H, path: &Path) -> Result<BlobHash, BlobError> {
        let size = checked_size(path)?;
        handler.log("Saving blob...");

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path).map_err(|e| io_err(path, e))?;
        let url = format!("{}{UPLOAD_PATH}", self.base_url);
        tracing::debug!(%url, size, file = %name, "uploading blob");

        let response = self
            .agent
            .put(&url)
            .set("Cookie", &self.cookie)
            .set("Filename", &name)
            .set("Content-Length", &size.to_string())
            .send(file)?;
        check_status(&response)?;

        let body = response.into_string().map_err(BlobError::Read)?;
        let hash = body.trim();
        if hash.is_empty() {
            return Err(BlobError::EmptyHash);
        }
        tracing::info!(hash, size, "blob uploaded");
        Ok(BlobHash::from(hash))
    }

    /// Open the payload stored under `hash` as a stream.
    pub fn get_blob_stream(&self, hash: &BlobHash) -> Result<Box<dyn Read + Send + Sync>, BlobError> {
        validate_hash(hash)?;
        let url = format!("{}{DOWNLOAD_PATH}{hash}", self.base_url);
        tracing::debug!(%url, "downloading blob");
        let response = self.agent.get(&url).set("Cookie", &self.cookie).call()?;
        check_status(&response)?;
        Ok(response.into_reader())
    }

    /// Download the payload stored under `hash` into `dest`; returns bytes written.
    pub fn get_blob<H: TaskHandler>(
        &self,
        handler: &H,
        hash: &BlobHash,
        dest: &Path,
    ) -> Result<u64, BlobError> {
        handler.log("Loading blob...");
        let mut reader = self.get_blob_stream(hash)?;
        let mut file = File::create(dest).map_err(|e| io_err(dest, e))?;
        let written = copy_stream(&mut reader, &mut file, dest)?;
        tracing::info!(%hash, bytes = written, dest = %dest.display(), "blob downloaded");
        Ok(written)
    }
}

impl BlobStore for BlobClient {
    fn put<H: TaskHandler>(&self, handler: &H, path: &Path) -> Result<BlobHash, BlobError> {
        self.put_blob(handler, path)
    }

    fn get_to<H: TaskHandler>(
        &self,
        handler: &H,
        hash: &BlobHash,
        dest: &Path,
    ) -> Result<u64, BlobError> {
        self.get_blob(handler, hash, dest)
    }
}

fn check_status(response: &ureq::Response) -> Result<(), BlobError> {
    let code = response.status();
    if (200..300).contains(&code) {
        return Ok(());
    }
    Err(BlobError::Status {
        code,
        reason: response.status_text().to_string(),
    })
}

/// Copy a response body to a file, separating read failures (network) from
/// write failures (local disk).
fn copy_stream(reader: &mut dyn Read, file: &mut File, dest: &Path) -> Result<u64, BlobError> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BlobError::Read(e)),
        };
        io::Write::write_all(file, &buf[..n]).map_err(|e| io_err(dest, e))?;
        total += n as u64;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_follows_config() {
        let config = ClientConfig {
            host: "judge.local".to_string(),
            blobs_port: 8080,
            use_ssl: false,
            token: None,
        };
        let client = BlobClient::from_config(&config).expect("client");
        assert_eq!(client.base_url(), "http://judge.local:8080");
        assert_eq!(client.cookie, "satori_token=");
    }

    #[test]
    fn tls_client_builds() {
        let config = ClientConfig {
            host: "judge.local".to_string(),
            ..ClientConfig::default()
        };
        let client = BlobClient::new(&config, "tok").expect("client");
        assert!(client.base_url().starts_with("https://"));
        assert_eq!(client.cookie, "satori_token=tok");
    }

    #[test]
    fn invalid_hash_is_rejected_before_request() {
        let config = ClientConfig {
            use_ssl: false,
            ..ClientConfig::default()
        };
        let client = BlobClient::from_config(&config).expect("client");
        let err = client
            .get_blob_stream(&BlobHash::from("../../secret"))
            .err()
            .expect("error");
        assert!(matches!(err, BlobError::InvalidHash(_)));
    }
}
