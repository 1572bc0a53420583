//! Shared last-known remote state, one snapshot per record.
//!
//! A [`SnapshotList`] is the arena of snapshots of one kind under one
//! problem, indexed by id. Entities never own a snapshot; they hold the id
//! and the token of their reference registration, and look the snapshot up
//! through the list.
//!
//! A snapshot is *partial* while it is listed but not fetched yet. Reading
//! the state of a partial or removed snapshot where a complete one is
//! required panics.
//!
//! Notification hands out a stable copy of the reference list after the
//! arena borrow is released, so reference callbacks may read the list, but
//! must not be running while the list is mutated from inside them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use satori_core::{ListenerToken, Listeners, RecordId, TaskHandler};

use crate::error::ModelError;
use crate::reference::RemoteEvent;
use crate::service::RecordService;
use crate::state::RecordState;

#[derive(Debug)]
pub struct Snapshot<S> {
    id: RecordId,
    state: Option<S>,
    fetched_at: Option<DateTime<Utc>>,
    references: Listeners<RemoteEvent<S>>,
}

impl<S: RecordState> Snapshot<S> {
    fn partial(id: RecordId) -> Self {
        Self {
            id,
            state: None,
            fetched_at: None,
            references: Listeners::new(),
        }
    }

    fn complete(id: RecordId, state: S) -> Self {
        Self {
            id,
            state: Some(state),
            fetched_at: Some(Utc::now()),
            references: Listeners::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// `None` while partial.
    pub fn state(&self) -> Option<&S> {
        self.state.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_some()
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    fn set(&mut self, state: S) {
        self.state = Some(state);
        self.fetched_at = Some(Utc::now());
    }
}

/// Arena of snapshots of one record kind. Clones share the same arena.
#[derive(Debug)]
pub struct SnapshotList<S> {
    entries: Rc<RefCell<BTreeMap<RecordId, Snapshot<S>>>>,
}

impl<S> Clone for SnapshotList<S> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<S: RecordState> Default for SnapshotList<S> {
    fn default() -> Self {
        Self {
            entries: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }
}

impl<S: RecordState> SnapshotList<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.entries.borrow().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    pub fn is_complete(&self, id: RecordId) -> bool {
        self.entries
            .borrow()
            .get(&id)
            .is_some_and(Snapshot::is_complete)
    }

    /// Cached state of `id`; `None` if unlisted or partial.
    pub fn state(&self, id: RecordId) -> Option<S> {
        self.entries.borrow().get(&id).and_then(|s| s.state.clone())
    }

    pub fn fetched_at(&self, id: RecordId) -> Option<DateTime<Utc>> {
        self.entries.borrow().get(&id).and_then(Snapshot::fetched_at)
    }

    /// Number of entities observing `id`; zero if unlisted.
    pub fn reference_count(&self, id: RecordId) -> usize {
        self.entries
            .borrow()
            .get(&id)
            .map_or(0, Snapshot::reference_count)
    }

    /// State of a snapshot that must be listed and complete.
    ///
    /// # Panics
    ///
    /// If `id` is unlisted or partial.
    pub fn complete_state(&self, id: RecordId) -> S {
        match self.state(id) {
            Some(state) => state,
            None => panic!("{} snapshot {id} is deleted or incomplete", S::KIND),
        }
    }

    /// List `id` without fetching it. Returns `false` if already listed.
    pub fn insert_partial(&self, id: RecordId) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(&id) {
            return false;
        }
        entries.insert(id, Snapshot::partial(id));
        true
    }

    /// List `id` with a known state. An already listed snapshot is updated
    /// and its references notified.
    pub fn insert(&self, id: RecordId, state: S) {
        if self.contains(id) {
            self.update(id, state, None);
            return;
        }
        self.entries
            .borrow_mut()
            .insert(id, Snapshot::complete(id, state));
    }

    /// Register a reference on `id`.
    ///
    /// # Panics
    ///
    /// If `id` is not listed.
    pub fn add_reference(
        &self,
        id: RecordId,
        callback: impl Fn(&RemoteEvent<S>) + 'static,
    ) -> ListenerToken {
        let mut entries = self.entries.borrow_mut();
        match entries.get_mut(&id) {
            Some(snapshot) => snapshot.references.add(callback),
            None => panic!("{} snapshot {id} is not listed", S::KIND),
        }
    }

    /// Remove one registration. No-op (returns `false`) if `id` has left the
    /// list or the token is unknown.
    pub fn remove_reference(&self, id: RecordId, token: ListenerToken) -> bool {
        self.entries
            .borrow_mut()
            .get_mut(&id)
            .is_some_and(|snapshot| snapshot.references.remove(token))
    }

    /// Replace the state of `id` and tell every reference except `skip`.
    ///
    /// # Panics
    ///
    /// If `id` is not listed.
    pub fn update(&self, id: RecordId, state: S, skip: Option<ListenerToken>) {
        let delivery = {
            let mut entries = self.entries.borrow_mut();
            let Some(snapshot) = entries.get_mut(&id) else {
                panic!("{} snapshot {id} is not listed", S::KIND);
            };
            snapshot.set(state.clone());
            match skip {
                Some(token) => snapshot.references.delivery_except(token),
                None => snapshot.references.delivery(),
            }
        };
        tracing::debug!(kind = S::KIND, %id, references = delivery.len(), "snapshot updated");
        delivery.send(&RemoteEvent::Modified { id, state });
    }

    /// Take `id` out of the list and tell every reference except `skip` that
    /// the record is gone. Returns `false` if it was not listed.
    pub fn remove(&self, id: RecordId, skip: Option<ListenerToken>) -> bool {
        let Some(snapshot) = self.entries.borrow_mut().remove(&id) else {
            return false;
        };
        let delivery = match skip {
            Some(token) => snapshot.references.delivery_except(token),
            None => snapshot.references.delivery(),
        };
        tracing::debug!(kind = S::KIND, %id, references = delivery.len(), "snapshot removed");
        delivery.send(&RemoteEvent::Deleted { id });
        true
    }

    /// Fetch `id` from `service`, even if the snapshot is already complete,
    /// and notify every reference.
    pub fn reload<H, R>(&self, id: RecordId, handler: &H, service: &R) -> Result<S, ModelError>
    where
        H: TaskHandler,
        R: RecordService<S>,
    {
        let state = handler.execute(|| service.fetch(id).map_err(ModelError::from))?;
        if self.contains(id) {
            self.update(id, state.clone(), None);
        } else {
            self.insert(id, state.clone());
        }
        Ok(state)
    }

    /// Reconcile the listing with the ids `service` reports under
    /// `problem_id`: new ids are listed as partial snapshots, vanished ones
    /// are removed with a deletion notice.
    pub fn refresh<H, R>(&self, problem_id: RecordId, handler: &H, service: &R) -> Result<(), ModelError>
    where
        H: TaskHandler,
        R: RecordService<S>,
    {
        let listed = handler.execute(|| service.list(problem_id).map_err(ModelError::from))?;
        let vanished: Vec<RecordId> = self
            .ids()
            .into_iter()
            .filter(|id| !listed.contains(id))
            .collect();
        let added = listed.iter().filter(|id| self.insert_partial(**id)).count();
        for id in &vanished {
            self.remove(*id, None);
        }
        tracing::info!(
            kind = S::KIND,
            %problem_id,
            added,
            removed = vanished.len(),
            "listing refreshed"
        );
        Ok(())
    }
}
