//! Output packaging for model evaluations

use crate::types::variable::{OutputVariable, Value};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How `evaluate` packages its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Name to current value of each output variable
    #[serde(alias = "string")]
    Raw,
    /// Name to the untransformed model output slot
    #[default]
    Tensor,
    /// Full output variable records, bounds included
    Variable,
}

/// Result of one evaluation, shaped by the adapter's [`OutputFormat`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Raw(HashMap<String, Value>),
    Tensor(HashMap<String, ArrayD<f64>>),
    Variable(Vec<OutputVariable>),
}

impl Evaluation {
    pub fn format(&self) -> OutputFormat {
        match self {
            Evaluation::Raw(_) => OutputFormat::Raw,
            Evaluation::Tensor(_) => OutputFormat::Tensor,
            Evaluation::Variable(_) => OutputFormat::Variable,
        }
    }

    /// Number of named outputs.
    pub fn len(&self) -> usize {
        match self {
            Evaluation::Raw(values) => values.len(),
            Evaluation::Tensor(values) => values.len(),
            Evaluation::Variable(variables) => variables.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of one output regardless of packaging.
    pub fn value(&self, name: &str) -> Option<Value> {
        match self {
            Evaluation::Raw(values) => values.get(name).cloned(),
            Evaluation::Tensor(values) => values.get(name).cloned().map(Value::Array),
            Evaluation::Variable(variables) => variables
                .iter()
                .find(|v| v.name == name)
                .and_then(|v| v.value.clone()),
        }
    }

    /// JSON rendering with outputs keyed by name.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Evaluation::Raw(values) => {
                serde_json::to_value(values.iter().collect::<BTreeMap<_, _>>())
            }
            Evaluation::Tensor(values) => serde_json::to_value(
                values
                    .iter()
                    .map(|(name, array)| (name, Value::Array(array.clone())))
                    .collect::<BTreeMap<_, _>>(),
            ),
            Evaluation::Variable(variables) => serde_json::to_value(
                variables
                    .iter()
                    .map(|v| (&v.name, v))
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }
}
