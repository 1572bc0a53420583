//! Reconciliation of a working copy against its snapshot.
//!
//! A check compares field by field and stops at the first difference. The
//! result only decides whether the entity becomes outdated; nothing is
//! merged.

use std::fmt;

use satori_core::RecordId;

use crate::state::{RecordState, TestMember, TestState, TestSuiteState};

/// The field in which a working copy first differs from its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    Name,
    Description,
    Attributes,
    Tests,
    Dispatcher,
    Accumulators,
    Reporter,
    GeneralParameters,
    TestParameters,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Attributes => "attributes",
            Self::Tests => "tests",
            Self::Dispatcher => "dispatcher",
            Self::Accumulators => "accumulators",
            Self::Reporter => "reporter",
            Self::GeneralParameters => "general parameters",
            Self::TestParameters => "test parameters",
        };
        f.write_str(s)
    }
}

/// Compare a working copy with the snapshot it observes.
///
/// # Panics
///
/// If the identifiers or the parent problem identifiers differ. An entity is
/// only ever attached to the snapshot of its own record.
pub fn diverged<S: RecordState>(
    local_id: Option<RecordId>,
    local: &S,
    remote_id: RecordId,
    remote: &S,
) -> Option<Divergence> {
    assert_eq!(
        local_id,
        Some(remote_id),
        "{} ids don't match",
        S::KIND
    );
    assert_eq!(
        local.problem_id(),
        remote.problem_id(),
        "problem ids don't match for {} {remote_id}",
        S::KIND
    );
    local.diverges_from(remote)
}

pub(crate) fn test_divergence(local: &TestState, remote: &TestState) -> Option<Divergence> {
    if local.name != remote.name {
        return Some(Divergence::Name);
    }
    if local.attrs != remote.attrs {
        return Some(Divergence::Attributes);
    }
    None
}

pub(crate) fn suite_divergence(
    local: &TestSuiteState,
    remote: &TestSuiteState,
) -> Option<Divergence> {
    if local.name != remote.name {
        return Some(Divergence::Name);
    }
    if local.description != remote.description {
        return Some(Divergence::Description);
    }
    if test_list_diverged(&local.tests, &remote.tests) {
        return Some(Divergence::Tests);
    }
    if local.dispatcher != remote.dispatcher {
        return Some(Divergence::Dispatcher);
    }
    if local.accumulators != remote.accumulators {
        return Some(Divergence::Accumulators);
    }
    if local.reporter != remote.reporter {
        return Some(Divergence::Reporter);
    }
    if local.general_params != remote.general_params {
        return Some(Divergence::GeneralParameters);
    }
    if local.test_params != remote.test_params {
        return Some(Divergence::TestParameters);
    }
    None
}

/// Positional comparison of membership lists.
///
/// A snapshot entry that carries an id diverges unless the local entry at the
/// same position has the same id. A snapshot entry without an id never
/// diverges, whatever the local entry holds.
pub fn test_list_diverged(local: &[TestMember], remote: &[TestMember]) -> bool {
    if local.len() != remote.len() {
        return true;
    }
    local.iter().zip(remote).any(|(l, r)| match r.id() {
        Some(id) => l.id() != Some(id),
        None => false,
    })
}
