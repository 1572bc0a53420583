//! The relation between a snapshot and the entities observing it.

use satori_core::{ListenerToken, RecordId};

/// What a snapshot tells its references.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent<S> {
    /// The snapshot now holds `state`.
    Modified { id: RecordId, state: S },
    /// The record is gone and the snapshot has left its listing.
    Deleted { id: RecordId },
}

impl<S> RemoteEvent<S> {
    pub fn id(&self) -> RecordId {
        match self {
            Self::Modified { id, .. } | Self::Deleted { id } => *id,
        }
    }
}

/// An entity's registration on one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLink {
    pub id: RecordId,
    pub token: ListenerToken,
}
