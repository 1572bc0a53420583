//! Record payloads exchanged with the record service and cached in snapshots.

use std::collections::BTreeMap;
use std::fmt;

use satori_core::{BlobValue, FieldValue, InputKey, ParametersMetadata, RecordId, TestCaseMetadata};

use crate::check::{self, Divergence};
use crate::problem::Problem;
use crate::snapshot::SnapshotList;

/// Behaviour shared by every record kind an entity can edit.
pub trait RecordState: Clone + PartialEq + fmt::Debug + 'static {
    /// Human-readable kind, used in messages.
    const KIND: &'static str;

    fn problem_id(&self) -> RecordId;

    /// First field in which `self` differs from `remote`, if any.
    fn diverges_from(&self, remote: &Self) -> Option<Divergence>;

    /// Every blob held by the record, for uploading before a write.
    fn blobs_mut(&mut self) -> Vec<&mut BlobValue>;

    /// The listing of this kind under `problem`.
    fn listing(problem: &Problem) -> &SnapshotList<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestState {
    pub problem_id: RecordId,
    pub name: String,
    pub attrs: BTreeMap<String, FieldValue>,
}

impl TestState {
    /// Unnamed test with the default judge's attribute defaults.
    pub fn new(problem_id: RecordId) -> Self {
        Self::with_metadata(problem_id, &TestCaseMetadata::default_judge())
    }

    pub fn with_metadata(problem_id: RecordId, metadata: &TestCaseMetadata) -> Self {
        Self {
            problem_id,
            name: String::new(),
            attrs: metadata.default_attrs(),
        }
    }
}

impl RecordState for TestState {
    const KIND: &'static str = "test";

    fn problem_id(&self) -> RecordId {
        self.problem_id
    }

    fn diverges_from(&self, remote: &Self) -> Option<Divergence> {
        check::test_divergence(self, remote)
    }

    fn blobs_mut(&mut self) -> Vec<&mut BlobValue> {
        self.attrs.values_mut().filter_map(blob_mut).collect()
    }

    fn listing(problem: &Problem) -> &SnapshotList<Self> {
        problem.tests()
    }
}

/// One position in a suite's test list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestMember {
    Remote(RecordId),
    /// A test that has not been created remotely yet.
    Local(String),
}

impl TestMember {
    pub fn id(&self) -> Option<RecordId> {
        match self {
            Self::Remote(id) => Some(*id),
            Self::Local(_) => None,
        }
    }
}

impl From<RecordId> for TestMember {
    fn from(id: RecordId) -> Self {
        Self::Remote(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuiteState {
    pub problem_id: RecordId,
    pub name: String,
    pub description: String,
    pub tests: Vec<TestMember>,
    pub dispatcher: Option<ParametersMetadata>,
    pub accumulators: Vec<ParametersMetadata>,
    pub reporter: Option<ParametersMetadata>,
    pub general_params: BTreeMap<InputKey, FieldValue>,
    pub test_params: BTreeMap<(InputKey, RecordId), FieldValue>,
}

impl TestSuiteState {
    pub fn new(problem_id: RecordId) -> Self {
        Self {
            problem_id,
            name: String::new(),
            description: String::new(),
            tests: Vec::new(),
            dispatcher: None,
            accumulators: Vec::new(),
            reporter: None,
            general_params: BTreeMap::new(),
            test_params: BTreeMap::new(),
        }
    }

    /// Every metadata block currently attached, dispatcher first.
    pub fn metadata(&self) -> impl Iterator<Item = &ParametersMetadata> {
        self.dispatcher
            .iter()
            .chain(self.accumulators.iter())
            .chain(self.reporter.iter())
    }
}

impl RecordState for TestSuiteState {
    const KIND: &'static str = "test suite";

    fn problem_id(&self) -> RecordId {
        self.problem_id
    }

    fn diverges_from(&self, remote: &Self) -> Option<Divergence> {
        check::suite_divergence(self, remote)
    }

    fn blobs_mut(&mut self) -> Vec<&mut BlobValue> {
        self.general_params
            .values_mut()
            .chain(self.test_params.values_mut())
            .filter_map(blob_mut)
            .collect()
    }

    fn listing(problem: &Problem) -> &SnapshotList<Self> {
        problem.suites()
    }
}

fn blob_mut(value: &mut FieldValue) -> Option<&mut BlobValue> {
    match value {
        FieldValue::Blob(blob) => Some(blob),
        FieldValue::Text(_) => None,
    }
}
