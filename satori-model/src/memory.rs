//! In-memory record service.
//!
//! Used by tests and offline sessions. Besides storing records it counts
//! calls per operation and can fail the next call with a chosen error.
//! `remote_*` methods act as another client would, without touching the
//! counters.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use satori_core::RecordId;

use crate::error::ServiceError;
use crate::service::RecordService;
use crate::state::RecordState;

/// Number of calls received per operation, failed calls included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
    pub fetch: usize,
    pub list: usize,
}

#[derive(Debug)]
pub struct MemoryRecordService<S> {
    records: RefCell<BTreeMap<RecordId, S>>,
    next_id: Cell<i64>,
    calls: Cell<CallCounts>,
    fail_next: RefCell<Option<ServiceError>>,
}

impl<S: RecordState> Default for MemoryRecordService<S> {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl<S: RecordState> MemoryRecordService<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service whose first assigned id is `first_id`.
    pub fn starting_at(first_id: i64) -> Self {
        Self {
            records: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(first_id),
            calls: Cell::new(CallCounts::default()),
            fail_next: RefCell::new(None),
        }
    }

    pub fn calls(&self) -> CallCounts {
        self.calls.get()
    }

    /// Make the next call of any operation fail with `error`.
    pub fn fail_next(&self, error: ServiceError) {
        *self.fail_next.borrow_mut() = Some(error);
    }

    pub fn record(&self, id: RecordId) -> Option<S> {
        self.records.borrow().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Store `state` as if another client had created it.
    pub fn remote_insert(&self, state: S) -> RecordId {
        let id = self.allocate();
        self.records.borrow_mut().insert(id, state);
        id
    }

    /// Edit record `id` as another client would. Returns `false` if absent.
    pub fn remote_edit(&self, id: RecordId, edit: impl FnOnce(&mut S)) -> bool {
        match self.records.borrow_mut().get_mut(&id) {
            Some(state) => {
                edit(state);
                true
            }
            None => false,
        }
    }

    pub fn remote_delete(&self, id: RecordId) -> bool {
        self.records.borrow_mut().remove(&id).is_some()
    }

    fn allocate(&self) -> RecordId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        RecordId(id)
    }

    fn enter(&self, count: impl FnOnce(&mut CallCounts)) -> Result<(), ServiceError> {
        let mut calls = self.calls.get();
        count(&mut calls);
        self.calls.set(calls);
        match self.fail_next.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(id: RecordId) -> ServiceError {
        ServiceError::NotFound { kind: S::KIND, id }
    }
}

impl<S: RecordState> RecordService<S> for MemoryRecordService<S> {
    fn insert(&self, state: &S) -> Result<RecordId, ServiceError> {
        self.enter(|c| c.insert += 1)?;
        let id = self.allocate();
        self.records.borrow_mut().insert(id, state.clone());
        tracing::debug!(kind = S::KIND, %id, "record inserted");
        Ok(id)
    }

    fn update(&self, id: RecordId, state: &S) -> Result<(), ServiceError> {
        self.enter(|c| c.update += 1)?;
        match self.records.borrow_mut().get_mut(&id) {
            Some(slot) => {
                *slot = state.clone();
                Ok(())
            }
            None => Err(Self::not_found(id)),
        }
    }

    fn delete(&self, id: RecordId) -> Result<(), ServiceError> {
        self.enter(|c| c.delete += 1)?;
        if self.records.borrow_mut().remove(&id).is_some() {
            Ok(())
        } else {
            Err(Self::not_found(id))
        }
    }

    fn fetch(&self, id: RecordId) -> Result<S, ServiceError> {
        self.enter(|c| c.fetch += 1)?;
        self.record(id).ok_or_else(|| Self::not_found(id))
    }

    fn list(&self, problem_id: RecordId) -> Result<Vec<RecordId>, ServiceError> {
        self.enter(|c| c.list += 1)?;
        Ok(self
            .records
            .borrow()
            .iter()
            .filter(|(_, state)| state.problem_id() == problem_id)
            .map(|(id, _)| *id)
            .collect())
    }
}
