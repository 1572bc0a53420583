//! A problem owns the snapshot listings of its tests and suites.

use satori_core::{RecordId, TaskHandler};

use crate::error::ModelError;
use crate::service::RecordService;
use crate::snapshot::SnapshotList;
use crate::state::{TestState, TestSuiteState};

/// Handle to one problem's listings. Clones share the listings.
#[derive(Debug, Clone)]
pub struct Problem {
    id: RecordId,
    tests: SnapshotList<TestState>,
    suites: SnapshotList<TestSuiteState>,
}

impl Problem {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            tests: SnapshotList::new(),
            suites: SnapshotList::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn tests(&self) -> &SnapshotList<TestState> {
        &self.tests
    }

    pub fn suites(&self) -> &SnapshotList<TestSuiteState> {
        &self.suites
    }

    /// List the problem's tests as partial snapshots.
    pub fn refresh_tests<H, R>(&self, handler: &H, service: &R) -> Result<(), ModelError>
    where
        H: TaskHandler,
        R: RecordService<TestState>,
    {
        self.tests.refresh(self.id, handler, service)
    }

    pub fn refresh_suites<H, R>(&self, handler: &H, service: &R) -> Result<(), ModelError>
    where
        H: TaskHandler,
        R: RecordService<TestSuiteState>,
    {
        self.suites.refresh(self.id, handler, service)
    }
}
