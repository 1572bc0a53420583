//! Tests: a name plus judge attributes.

use std::collections::BTreeMap;
use std::path::Path;

use satori_blob::BlobStore;
use satori_core::{BlobValue, FieldValue, TaskHandler, TestCaseMetadata};

use crate::entity::{Entity, EntityEvent};
use crate::error::{io_err, ModelError};
use crate::problem::Problem;
use crate::state::TestState;

pub type Test = Entity<TestState>;

impl Entity<TestState> {
    /// Detached test seeded with the default judge's attributes.
    pub fn create_new(problem: &Problem) -> Self {
        Self::detached(problem, TestState::new(problem.id()))
    }

    pub fn create_new_with(problem: &Problem, metadata: &TestCaseMetadata) -> Self {
        Self::detached(problem, TestState::with_metadata(problem.id(), metadata))
    }

    pub fn name(&self) -> String {
        self.read(|s| s.name.clone())
    }

    pub fn attr(&self, key: &str) -> Option<FieldValue> {
        self.read(|s| s.attrs.get(key).cloned())
    }

    pub fn attrs(&self) -> BTreeMap<String, FieldValue> {
        self.read(|s| s.attrs.clone())
    }

    /// Returns `false` when `name` is already the current name.
    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.edit(&[], |s| {
            if s.name == name {
                return false;
            }
            s.name = name;
            true
        })
    }

    /// Set or, with `None`, clear attribute `key`.
    pub fn set_attr(&mut self, key: impl Into<String>, value: Option<FieldValue>) -> bool {
        let key = key.into();
        self.edit(&[EntityEvent::DataChanged], |s| {
            if s.attrs.get(&key) == value.as_ref() {
                return false;
            }
            match value {
                Some(value) => s.attrs.insert(key, value),
                None => s.attrs.remove(&key),
            };
            true
        })
    }

    /// Give the blob held by `key` a new name. The payload is untouched.
    pub fn rename_blob_attr(&mut self, key: &str, name: impl Into<String>) -> Result<bool, ModelError> {
        let blob = self.blob_attr(key)?;
        Ok(self.set_attr(key, Some(blob.renamed(name).into())))
    }

    /// Copy the blob held by `key` into `dest`; returns bytes written.
    pub fn download_attr<H, B>(&self, handler: &H, blobs: &B, key: &str, dest: &Path) -> Result<u64, ModelError>
    where
        H: TaskHandler,
        B: BlobStore,
    {
        let blob = self.blob_attr(key)?;
        handler.execute(|| -> Result<u64, ModelError> {
            match &blob {
                BlobValue::Remote { hash, .. } => Ok(blobs.get_to(handler, hash, dest)?),
                BlobValue::Local { path, .. } => {
                    std::fs::copy(path, dest).map_err(|e| io_err(path, e))
                }
            }
        })
    }

    fn blob_attr(&self, key: &str) -> Result<BlobValue, ModelError> {
        self.attr(key)
            .and_then(|value| value.as_blob().cloned())
            .ok_or_else(|| ModelError::NotABlob(key.to_string()))
    }
}
