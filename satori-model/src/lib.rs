//! # satori-model
//!
//! Editable tests and test suites mirrored from a remote record service.
//!
//! Each [`Problem`] keeps one [`SnapshotList`] per record kind: the last
//! known remote state of every listed record. [`Test`] and [`TestSuite`]
//! editors attach to a snapshot, track a [`Status`](satori_core::Status) and
//! become outdated when another editor or a listing refresh changes the
//! snapshot underneath them.
//!
//! ```text
//! edit ──► Entity ──► observers
//!            ▲  │ create/save/reload/delete (inside TaskHandler::execute)
//!            │  ▼
//!   RemoteEvent ◄── SnapshotList ◄── RecordService
//! ```

pub mod check;
pub mod entity;
pub mod error;
pub mod memory;
pub mod problem;
pub mod reference;
pub mod service;
pub mod snapshot;
pub mod state;
pub mod suite;
pub mod test_case;

pub use check::Divergence;
pub use entity::{Entity, EntityEvent};
pub use error::{ModelError, ServiceError};
pub use memory::{CallCounts, MemoryRecordService};
pub use problem::Problem;
pub use reference::{RemoteEvent, SnapshotLink};
pub use service::RecordService;
pub use snapshot::{Snapshot, SnapshotList};
pub use state::{RecordState, TestMember, TestState, TestSuiteState};
pub use suite::TestSuite;
pub use test_case::Test;
