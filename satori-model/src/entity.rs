//! Editable working copies of remote records.
//!
//! An [`Entity`] is either *detached* (no id, no snapshot) or *remote* (id
//! set, one reference registered on the snapshot of that id). Remote work
//! always runs inside `TaskHandler::execute`; the entity is only touched
//! after that work has returned `Ok`, so a failed or cancelled operation
//! leaves it exactly as it was.
//!
//! Entities are `!Send`: the core lives in an `Rc<RefCell<_>>` that the
//! snapshot reaches through a weak handle. Observer and reference callbacks
//! run with no borrow held, but must not start remote operations on the
//! entity that is notifying them.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use satori_blob::BlobStore;
use satori_core::{BlobValue, DataStatus, ListenerToken, Listeners, RecordId, Status, TaskHandler};

use crate::check;
use crate::error::ModelError;
use crate::problem::Problem;
use crate::reference::{RemoteEvent, SnapshotLink};
use crate::service::RecordService;
use crate::state::RecordState;

/// Notifications sent to an entity's observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEvent {
    /// A local edit happened. Read [`Entity::status`] for the resulting status.
    Modified,
    Outdated,
    UpToDate,
    /// Test attributes changed.
    DataChanged,
    /// Suite dispatcher, accumulators or reporter changed.
    MetadataChanged,
}

struct Core<S> {
    id: Option<RecordId>,
    state: S,
    status: DataStatus,
    link: Option<SnapshotLink>,
    observers: Listeners<EntityEvent>,
}

pub struct Entity<S: RecordState> {
    core: Rc<RefCell<Core<S>>>,
    problem: Problem,
}

impl<S: RecordState> fmt::Debug for Entity<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("Entity")
            .field("kind", &S::KIND)
            .field("id", &core.id)
            .field("status", &core.status.status())
            .finish_non_exhaustive()
    }
}

impl<S: RecordState> Entity<S> {
    pub(crate) fn detached(problem: &Problem, state: S) -> Self {
        assert_eq!(
            state.problem_id(),
            problem.id(),
            "{} state belongs to another problem",
            S::KIND
        );
        Self {
            core: Rc::new(RefCell::new(Core {
                id: None,
                state,
                status: DataStatus::new(),
                link: None,
                observers: Listeners::new(),
            })),
            problem: problem.clone(),
        }
    }

    /// Open an editor on the listed record `id`. A partial snapshot is
    /// fetched first.
    pub fn open<H, R>(problem: &Problem, id: RecordId, handler: &H, service: &R) -> Result<Self, ModelError>
    where
        H: TaskHandler,
        R: RecordService<S>,
    {
        let listing = S::listing(problem);
        if !listing.is_complete(id) {
            listing.reload(id, handler, service)?;
        }
        let state = listing.complete_state(id);
        let entity = Self::detached(problem, state);
        entity.core.borrow_mut().id = Some(id);
        entity.attach(id);
        tracing::debug!(kind = S::KIND, %id, "editor opened");
        Ok(entity)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.core.borrow().id
    }

    pub fn is_remote(&self) -> bool {
        self.id().is_some()
    }

    /// True while a snapshot reference is registered.
    pub fn is_attached(&self) -> bool {
        self.core.borrow().link.is_some()
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn status(&self) -> Status {
        self.core.borrow().status.status()
    }

    pub fn is_modified(&self) -> bool {
        self.core.borrow().status.is_modified()
    }

    pub fn is_outdated(&self) -> bool {
        self.core.borrow().status.is_outdated()
    }

    /// Copy of the working state.
    pub fn state(&self) -> S {
        self.core.borrow().state.clone()
    }

    pub fn subscribe(&self, callback: impl Fn(&EntityEvent) + 'static) -> ListenerToken {
        self.core.borrow_mut().observers.add(callback)
    }

    pub fn unsubscribe(&self, token: ListenerToken) -> bool {
        self.core.borrow_mut().observers.remove(token)
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.core.borrow().state)
    }

    /// Apply a local edit. `change` returns whether anything changed; only
    /// then is the entity marked modified and `events` delivered after
    /// [`EntityEvent::Modified`].
    pub(crate) fn edit(&mut self, events: &[EntityEvent], change: impl FnOnce(&mut S) -> bool) -> bool {
        let delivery = {
            let mut core = self.core.borrow_mut();
            if !change(&mut core.state) {
                return false;
            }
            core.status.mark_modified();
            core.observers.delivery()
        };
        delivery.send(&EntityEvent::Modified);
        for event in events {
            delivery.send(event);
        }
        true
    }

    /// Insert the working state as a new remote record.
    ///
    /// # Panics
    ///
    /// If the entity is already remote.
    pub fn create<H, R, B>(&mut self, handler: &H, service: &R, blobs: &B) -> Result<RecordId, ModelError>
    where
        H: TaskHandler,
        R: RecordService<S>,
        B: BlobStore,
    {
        assert!(!self.is_remote(), "{} already created", S::KIND);
        let mut submitted = self.state();
        let id = handler.execute(|| -> Result<RecordId, ModelError> {
            upload_blobs(handler, blobs, &mut submitted)?;
            Ok(service.insert(&submitted)?)
        })?;

        S::listing(&self.problem).insert(id, submitted.clone());
        let data_changed = {
            let mut core = self.core.borrow_mut();
            let changed = core.state != submitted;
            core.id = Some(id);
            core.state = submitted;
            core.status.mark_up_to_date();
            changed
        };
        self.attach(id);
        self.notify_synced(data_changed);
        tracing::info!(kind = S::KIND, %id, "created");
        Ok(id)
    }

    /// Write the whole working state over the remote record.
    ///
    /// # Panics
    ///
    /// If the entity is not remote or has been closed.
    pub fn save<H, R, B>(&mut self, handler: &H, service: &R, blobs: &B) -> Result<(), ModelError>
    where
        H: TaskHandler,
        R: RecordService<S>,
        B: BlobStore,
    {
        let link = self.expect_link("save");
        let mut submitted = self.state();
        handler.execute(|| -> Result<(), ModelError> {
            upload_blobs(handler, blobs, &mut submitted)?;
            Ok(service.update(link.id, &submitted)?)
        })?;

        let data_changed = {
            let mut core = self.core.borrow_mut();
            let changed = core.state != submitted;
            core.state = submitted.clone();
            core.status.mark_up_to_date();
            changed
        };
        self.notify_synced(data_changed);
        S::listing(&self.problem).update(link.id, submitted, Some(link.token));
        tracing::info!(kind = S::KIND, id = %link.id, "saved");
        Ok(())
    }

    /// Refetch the snapshot and discard every local edit.
    ///
    /// # Panics
    ///
    /// If the entity is not remote or has been closed.
    pub fn reload<H, R>(&mut self, handler: &H, service: &R) -> Result<(), ModelError>
    where
        H: TaskHandler,
        R: RecordService<S>,
    {
        let link = self.expect_link("reload");
        let fresh = handler.execute(|| service.fetch(link.id).map_err(ModelError::from))?;
        assert_eq!(
            fresh.problem_id(),
            self.problem.id(),
            "{} {} belongs to another problem",
            S::KIND,
            link.id
        );

        S::listing(&self.problem).update(link.id, fresh.clone(), Some(link.token));
        {
            let mut core = self.core.borrow_mut();
            core.state = fresh;
            core.status.mark_up_to_date();
        }
        self.notify_synced(true);
        tracing::info!(kind = S::KIND, id = %link.id, "reloaded");
        Ok(())
    }

    /// Delete the remote record. Other editors of it are told and become
    /// outdated; this one is left detached and outdated, and can be created
    /// again.
    ///
    /// # Panics
    ///
    /// If the entity is not remote or has been closed.
    pub fn delete<H, R>(&mut self, handler: &H, service: &R) -> Result<(), ModelError>
    where
        H: TaskHandler,
        R: RecordService<S>,
    {
        let link = self.expect_link("delete");
        handler.execute(|| service.delete(link.id).map_err(ModelError::from))?;

        S::listing(&self.problem).remove(link.id, Some(link.token));
        {
            let mut core = self.core.borrow_mut();
            core.link = None;
            core.id = None;
            core.status.mark_outdated();
        }
        self.notify(&[EntityEvent::Outdated]);
        tracing::info!(kind = S::KIND, id = %link.id, "deleted");
        Ok(())
    }

    /// Stop observing the snapshot. No remote calls; safe to repeat.
    pub fn close(&mut self) {
        self.detach();
    }

    fn attach(&self, id: RecordId) {
        let weak: Weak<RefCell<Core<S>>> = Rc::downgrade(&self.core);
        let token = S::listing(&self.problem).add_reference(id, move |event| {
            if let Some(core) = weak.upgrade() {
                on_remote(&core, event);
            }
        });
        self.core.borrow_mut().link = Some(SnapshotLink { id, token });
    }

    fn detach(&self) {
        let link = match self.core.try_borrow_mut() {
            Ok(mut core) => core.link.take(),
            Err(_) => return,
        };
        if let Some(link) = link {
            S::listing(&self.problem).remove_reference(link.id, link.token);
            tracing::debug!(kind = S::KIND, id = %link.id, "editor closed");
        }
    }

    fn expect_link(&self, op: &str) -> SnapshotLink {
        let core = self.core.borrow();
        assert!(
            core.id.is_some(),
            "cannot {op} a {} that is not created",
            S::KIND
        );
        match core.link {
            Some(link) => link,
            None => panic!("cannot {op} a closed {}", S::KIND),
        }
    }

    fn notify(&self, events: &[EntityEvent]) {
        let delivery = self.core.borrow().observers.delivery();
        for event in events {
            delivery.send(event);
        }
    }

    fn notify_synced(&self, data_changed: bool) {
        if data_changed {
            self.notify(&[EntityEvent::UpToDate, EntityEvent::DataChanged]);
        } else {
            self.notify(&[EntityEvent::UpToDate]);
        }
    }
}

impl<S: RecordState> Drop for Entity<S> {
    fn drop(&mut self) {
        self.detach();
    }
}

fn on_remote<S: RecordState>(core: &RefCell<Core<S>>, event: &RemoteEvent<S>) {
    let delivery = {
        let mut core = core.borrow_mut();
        match event {
            RemoteEvent::Modified { id, state } => {
                let Some(field) = check::diverged(core.id, &core.state, *id, state) else {
                    return;
                };
                tracing::warn!(kind = S::KIND, %id, %field, "remote copy changed");
            }
            RemoteEvent::Deleted { id } => {
                if core.link.map(|link| link.id) != Some(*id) {
                    return;
                }
                core.link = None;
                core.id = None;
                tracing::warn!(kind = S::KIND, %id, "remote record deleted");
            }
        }
        core.status.mark_outdated();
        core.observers.delivery()
    };
    delivery.send(&EntityEvent::Outdated);
}

/// Replace every local blob in `state` with its uploaded counterpart.
fn upload_blobs<S, H, B>(handler: &H, blobs: &B, state: &mut S) -> Result<(), ModelError>
where
    S: RecordState,
    H: TaskHandler,
    B: BlobStore,
{
    for blob in state.blobs_mut() {
        let BlobValue::Local { name, path } = &*blob else {
            continue;
        };
        let hash = blobs.put(handler, path)?;
        let name = name.clone();
        *blob = BlobValue::Remote { name, hash };
    }
    Ok(())
}
