//! Domain types shared by the entity model and the blob client.
//!
//! Identifiers are newtypes; an entity that may not exist remotely yet holds
//! an `Option<RecordId>` rather than a sentinel value.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier the remote record service assigns to a test, suite or problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Stable key of a metadata input (e.g. `"time"`, `"memory"`).
///
/// Parameter maps are keyed by this, never by metadata object identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputKey(pub String);

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for InputKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InputKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Content hash the blob server returns for an uploaded payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlobHash(pub String);

impl fmt::Display for BlobHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BlobHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BlobHash {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A binary payload referenced by a field.
///
/// Values are immutable: renaming produces a new value and leaves the stored
/// object untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlobValue {
    /// Not uploaded yet; the payload lives in a local file.
    Local { name: String, path: PathBuf },
    /// Persisted on the blob server under `hash`.
    Remote { name: String, hash: BlobHash },
}

impl BlobValue {
    /// Local blob named after the file's own name.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = file_name_of(&path);
        Self::Local { name, path }
    }

    pub fn remote(name: impl Into<String>, hash: impl Into<BlobHash>) -> Self {
        Self::Remote {
            name: name.into(),
            hash: hash.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Local { name, .. } | Self::Remote { name, .. } => name,
        }
    }

    /// `None` until the payload has been uploaded.
    pub fn hash(&self) -> Option<&BlobHash> {
        match self {
            Self::Local { .. } => None,
            Self::Remote { hash, .. } => Some(hash),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Same payload under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        match self {
            Self::Local { path, .. } => Self::Local {
                name,
                path: path.clone(),
            },
            Self::Remote { hash, .. } => Self::Remote {
                name,
                hash: hash.clone(),
            },
        }
    }
}

/// Typed value of an attribute or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Blob(BlobValue),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Blob(_) => None,
        }
    }

    pub fn as_blob(&self) -> Option<&BlobValue> {
        match self {
            Self::Text(_) => None,
            Self::Blob(b) => Some(b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<BlobValue> for FieldValue {
    fn from(b: BlobValue) -> Self {
        Self::Blob(b)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_else(|| path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
