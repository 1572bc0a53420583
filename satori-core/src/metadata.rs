//! Metadata describing the inputs of a judge and of pluggable suite components
//! (dispatchers, accumulators, reporters).
//!
//! Metadata is compared by value. Parameters a component declares are keyed
//! by their [`InputKey`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{FieldValue, InputKey};

/// What kind of value an input holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Value,
    File,
}

/// A single declared input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputMetadata {
    pub key: InputKey,
    pub description: String,
    pub kind: InputKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
}

impl InputMetadata {
    pub fn value(key: impl Into<InputKey>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            kind: InputKind::Value,
            required: false,
            default: None,
        }
    }

    pub fn file(key: impl Into<InputKey>, description: impl Into<String>) -> Self {
        Self {
            kind: InputKind::File,
            ..Self::value(key, description)
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn is_blob(&self) -> bool {
        self.kind == InputKind::File
    }
}

/// Metadata of a dispatcher, accumulator or reporter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParametersMetadata {
    pub name: String,
    /// Parameters set once per suite.
    #[serde(default)]
    pub general: Vec<InputMetadata>,
    /// Parameters set per (parameter, test) pair.
    #[serde(default)]
    pub per_test: Vec<InputMetadata>,
}

impl ParametersMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            general: Vec::new(),
            per_test: Vec::new(),
        }
    }

    pub fn with_general(mut self, input: InputMetadata) -> Self {
        self.general.push(input);
        self
    }

    pub fn with_per_test(mut self, input: InputMetadata) -> Self {
        self.per_test.push(input);
        self
    }
}

/// Inputs a judge expects from every test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseMetadata {
    pub name: String,
    pub inputs: Vec<InputMetadata>,
}

impl TestCaseMetadata {
    /// The built-in "Default judge" checker description.
    pub fn default_judge() -> Self {
        Self {
            name: "Default judge".to_string(),
            inputs: vec![
                InputMetadata::value("time", "Time limit").required(true),
                InputMetadata::value("memory", "Memory limit")
                    .required(true)
                    .with_default("1073741824"),
                InputMetadata::file("input", "Input file").required(true),
                InputMetadata::file("hint", "Output/hint file"),
                InputMetadata::file("checker", "Checker"),
            ],
        }
    }

    pub fn input(&self, key: &str) -> Option<&InputMetadata> {
        self.inputs.iter().find(|im| im.key.0 == key)
    }

    /// Attribute map seeded with every declared default.
    pub fn default_attrs(&self) -> BTreeMap<String, FieldValue> {
        self.inputs
            .iter()
            .filter_map(|im| im.default.clone().map(|v| (im.key.0.clone(), v)))
            .collect()
    }
}
