//! The seam between entities and the remote record authority.

use satori_core::RecordId;

use crate::error::ServiceError;
use crate::state::RecordState;

/// CRUD access to records of one kind.
///
/// Called from inside a task's `execute` scope. Implementations report
/// failures as they are; entities never retry.
pub trait RecordService<S: RecordState> {
    /// Store a new record; returns its freshly assigned id.
    fn insert(&self, state: &S) -> Result<RecordId, ServiceError>;

    /// Replace the whole record `id` with `state`.
    fn update(&self, id: RecordId, state: &S) -> Result<(), ServiceError>;

    fn delete(&self, id: RecordId) -> Result<(), ServiceError>;

    fn fetch(&self, id: RecordId) -> Result<S, ServiceError>;

    /// Ids of every record of this kind under `problem_id`.
    fn list(&self, problem_id: RecordId) -> Result<Vec<RecordId>, ServiceError>;
}
