//! Test suites: an ordered test list plus dispatcher, accumulator and
//! reporter metadata with their parameters.
//!
//! General parameters are keyed by [`InputKey`]. Swapping metadata purges
//! the parameters the old metadata declared and seeds the new metadata's
//! defaults, so the map never keeps keys no attached metadata declares
//! unless the user set them explicitly.

use std::collections::BTreeMap;

use satori_core::{FieldValue, InputKey, ParametersMetadata, RecordId};

use crate::entity::{Entity, EntityEvent};
use crate::problem::Problem;
use crate::state::{TestMember, TestSuiteState};

pub type TestSuite = Entity<TestSuiteState>;

impl Entity<TestSuiteState> {
    pub fn create_new(problem: &Problem) -> Self {
        Self::detached(problem, TestSuiteState::new(problem.id()))
    }

    pub fn name(&self) -> String {
        self.read(|s| s.name.clone())
    }

    pub fn description(&self) -> String {
        self.read(|s| s.description.clone())
    }

    pub fn tests(&self) -> Vec<TestMember> {
        self.read(|s| s.tests.clone())
    }

    /// True if some member has not been created remotely yet.
    pub fn has_local_tests(&self) -> bool {
        self.read(|s| s.tests.iter().any(|t| t.id().is_none()))
    }

    pub fn dispatcher(&self) -> Option<ParametersMetadata> {
        self.read(|s| s.dispatcher.clone())
    }

    pub fn accumulators(&self) -> Vec<ParametersMetadata> {
        self.read(|s| s.accumulators.clone())
    }

    pub fn reporter(&self) -> Option<ParametersMetadata> {
        self.read(|s| s.reporter.clone())
    }

    pub fn general_parameter(&self, key: &InputKey) -> Option<FieldValue> {
        self.read(|s| s.general_params.get(key).cloned())
    }

    pub fn general_parameters(&self) -> BTreeMap<InputKey, FieldValue> {
        self.read(|s| s.general_params.clone())
    }

    pub fn test_parameter(&self, key: &InputKey, test: RecordId) -> Option<FieldValue> {
        self.read(|s| s.test_params.get(&(key.clone(), test)).cloned())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.edit(&[], |s| replace(&mut s.name, name))
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> bool {
        let description = description.into();
        self.edit(&[], |s| replace(&mut s.description, description))
    }

    /// Replace the whole membership list.
    pub fn set_tests(&mut self, tests: Vec<TestMember>) -> bool {
        self.edit(&[], |s| replace(&mut s.tests, tests))
    }

    pub fn add_test(&mut self, test: impl Into<TestMember>) -> bool {
        let test = test.into();
        self.edit(&[], |s| {
            s.tests.push(test);
            true
        })
    }

    /// Drop the member at `index`; `false` if out of range.
    pub fn remove_test(&mut self, index: usize) -> bool {
        self.edit(&[], |s| {
            if index >= s.tests.len() {
                return false;
            }
            s.tests.remove(index);
            true
        })
    }

    pub fn set_dispatcher(&mut self, dispatcher: Option<ParametersMetadata>) -> bool {
        self.edit(&[EntityEvent::MetadataChanged], |s| {
            if s.dispatcher == dispatcher {
                return false;
            }
            let old = s.dispatcher.take();
            reconcile_parameters(s, old.iter(), dispatcher.iter());
            s.dispatcher = dispatcher;
            true
        })
    }

    pub fn set_accumulators(&mut self, accumulators: Vec<ParametersMetadata>) -> bool {
        self.edit(&[EntityEvent::MetadataChanged], |s| {
            if s.accumulators == accumulators {
                return false;
            }
            let old = std::mem::take(&mut s.accumulators);
            reconcile_parameters(s, old.iter(), accumulators.iter());
            s.accumulators = accumulators;
            true
        })
    }

    pub fn set_reporter(&mut self, reporter: Option<ParametersMetadata>) -> bool {
        self.edit(&[EntityEvent::MetadataChanged], |s| {
            if s.reporter == reporter {
                return false;
            }
            let old = s.reporter.take();
            reconcile_parameters(s, old.iter(), reporter.iter());
            s.reporter = reporter;
            true
        })
    }

    /// Set or, with `None`, clear general parameter `key`.
    pub fn set_general_parameter(&mut self, key: impl Into<InputKey>, value: Option<FieldValue>) -> bool {
        let key = key.into();
        self.edit(&[], |s| set_entry(&mut s.general_params, key, value))
    }

    /// Set or, with `None`, clear parameter `key` of member `test`.
    pub fn set_test_parameter(
        &mut self,
        key: impl Into<InputKey>,
        test: RecordId,
        value: Option<FieldValue>,
    ) -> bool {
        let key = key.into();
        self.edit(&[], |s| set_entry(&mut s.test_params, (key, test), value))
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn set_entry<K: Ord, V: PartialEq>(map: &mut BTreeMap<K, V>, key: K, value: Option<V>) -> bool {
    if map.get(&key) == value.as_ref() {
        return false;
    }
    match value {
        Some(value) => map.insert(key, value),
        None => map.remove(&key),
    };
    true
}

/// Purge parameters declared by metadata in `old` but not in `new`, then seed
/// the defaults of metadata in `new` but not in `old`.
fn reconcile_parameters<'a>(
    state: &mut TestSuiteState,
    old: impl Iterator<Item = &'a ParametersMetadata>,
    new: impl Iterator<Item = &'a ParametersMetadata>,
) {
    let old: Vec<_> = old.collect();
    let new: Vec<_> = new.collect();

    for meta in old.iter().copied().filter(|m| !new.contains(m)) {
        for input in &meta.general {
            state.general_params.remove(&input.key);
        }
        for input in &meta.per_test {
            state.test_params.retain(|(key, _), _| *key != input.key);
        }
    }
    for meta in new.iter().copied().filter(|m| !old.contains(m)) {
        for input in &meta.general {
            if let Some(default) = &input.default {
                state
                    .general_params
                    .insert(input.key.clone(), default.clone());
            }
        }
    }
}
