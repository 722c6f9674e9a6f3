//! Input and output variable records

use crate::error::{AdapterError, Result};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Numeric value held by a variable record.
///
/// Scalars and arrays are both double precision. Serialized as a plain number
/// or a nested list of numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Array(ArrayD<f64>),
}

impl Value {
    /// Convert to an array; scalars become zero-dimensional arrays.
    pub fn to_array(&self) -> ArrayD<f64> {
        match self {
            Value::Scalar(x) => ArrayD::from_elem(IxDyn(&[]), *x),
            Value::Array(array) => array.clone(),
        }
    }

    /// Extract the single element of this value.
    pub fn item(&self, name: &str) -> Result<f64> {
        match self {
            Value::Scalar(x) => Ok(*x),
            Value::Array(array) => scalar_item(name, array),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Array(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_nested(&self) -> NestedValue {
        match self {
            Value::Scalar(x) => NestedValue::Scalar(*x),
            Value::Array(array) => nest(array.view()),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(x)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(array: ArrayD<f64>) -> Self {
        Value::Array(array)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_nested().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        NestedValue::deserialize(deserializer)?
            .into_value()
            .map_err(de::Error::custom)
    }
}

/// Extract the single element of an array, failing on anything but one element.
pub(crate) fn scalar_item(name: &str, array: &ArrayD<f64>) -> Result<f64> {
    match array.len() {
        1 => array
            .iter()
            .next()
            .copied()
            .ok_or_else(|| AdapterError::NotAScalar {
                name: name.to_string(),
                len: 0,
            }),
        len => Err(AdapterError::NotAScalar {
            name: name.to_string(),
            len,
        }),
    }
}

/// Wire representation of a [`Value`]: a number or arbitrarily nested lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum NestedValue {
    Scalar(f64),
    List(Vec<NestedValue>),
}

impl NestedValue {
    /// Shape implied by following the first element at every depth.
    fn shape(&self) -> Vec<usize> {
        match self {
            NestedValue::Scalar(_) => Vec::new(),
            NestedValue::List(items) => {
                let mut shape = vec![items.len()];
                if let Some(first) = items.first() {
                    shape.extend(first.shape());
                }
                shape
            }
        }
    }

    /// Row-major flatten, returning false when the nesting is ragged.
    fn flatten_into(&self, shape: &[usize], data: &mut Vec<f64>) -> bool {
        match (self, shape.split_first()) {
            (NestedValue::Scalar(x), None) => {
                data.push(*x);
                true
            }
            (NestedValue::List(items), Some((&len, rest))) if items.len() == len => {
                items.iter().all(|item| item.flatten_into(rest, data))
            }
            _ => false,
        }
    }

    fn into_value(self) -> Result<Value> {
        if let NestedValue::Scalar(x) = self {
            return Ok(Value::Scalar(x));
        }
        let shape = self.shape();
        let mut data = Vec::with_capacity(shape.iter().product());
        if !self.flatten_into(&shape, &mut data) {
            return Err(AdapterError::RaggedArray);
        }
        Ok(Value::Array(ArrayD::from_shape_vec(IxDyn(&shape), data)?))
    }
}

fn nest(view: ArrayViewD<'_, f64>) -> NestedValue {
    if view.ndim() == 0 {
        return NestedValue::Scalar(view.iter().next().copied().unwrap_or_default());
    }
    NestedValue::List(view.axis_iter(Axis(0)).map(nest).collect())
}

/// Model input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputVariable {
    /// Unique name within the input registry
    pub name: String,
    /// Value used by the most recent evaluation
    #[serde(default)]
    pub value: Option<Value>,
    /// Fallback when a caller omits this input
    pub default: Value,
}

impl InputVariable {
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: None,
            default: default.into(),
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Current value, or the default when none has been set.
    pub fn current(&self) -> &Value {
        self.value.as_ref().unwrap_or(&self.default)
    }
}

/// Value supplied by a caller for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Full variable record; its current value is taken.
    Variable(InputVariable),
    /// Plain number.
    Scalar(f64),
    /// Tensor-like holding a single element.
    Tensor(ArrayD<f64>),
}

impl InputValue {
    /// Classify a bare value: numbers and one-element arrays are taken as
    /// scalars, larger arrays as the value of an input variable.
    pub fn from_value(name: &str, value: Value) -> Self {
        match value {
            Value::Scalar(x) => InputValue::Scalar(x),
            Value::Array(array) if array.len() == 1 => InputValue::Tensor(array),
            Value::Array(array) => InputValue::Variable(
                InputVariable::new(name, array.clone()).with_value(array),
            ),
        }
    }
}

impl From<f64> for InputValue {
    fn from(x: f64) -> Self {
        InputValue::Scalar(x)
    }
}

impl From<InputVariable> for InputValue {
    fn from(variable: InputVariable) -> Self {
        InputValue::Variable(variable)
    }
}

impl From<ArrayD<f64>> for InputValue {
    fn from(array: ArrayD<f64>) -> Self {
        InputValue::Tensor(array)
    }
}

/// One of the four axis bounds of an image output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    XMin,
    XMax,
    YMin,
    YMax,
}

/// Image-specific fields of an output variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageOutput {
    /// Shape each flat model output slot is reshaped into
    pub shape: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_min_variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_max_variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_min_variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_max_variable: Option<String>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
}

impl ImageOutput {
    pub fn new(shape: Vec<usize>) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Take a bound from the named output after every evaluation.
    pub fn with_bound_variable(mut self, bound: Bound, variable: impl Into<String>) -> Self {
        let variable = Some(variable.into());
        match bound {
            Bound::XMin => self.x_min_variable = variable,
            Bound::XMax => self.x_max_variable = variable,
            Bound::YMin => self.y_min_variable = variable,
            Bound::YMax => self.y_max_variable = variable,
        }
        self
    }

    /// Bounds that reference another output, with the referenced name.
    pub fn bound_references(&self) -> impl Iterator<Item = (Bound, &str)> {
        [
            (Bound::XMin, &self.x_min_variable),
            (Bound::XMax, &self.x_max_variable),
            (Bound::YMin, &self.y_min_variable),
            (Bound::YMax, &self.y_max_variable),
        ]
        .into_iter()
        .filter_map(|(bound, reference)| reference.as_deref().map(|name| (bound, name)))
    }

    pub fn bound(&self, bound: Bound) -> Option<f64> {
        match bound {
            Bound::XMin => self.x_min,
            Bound::XMax => self.x_max,
            Bound::YMin => self.y_min,
            Bound::YMax => self.y_max,
        }
    }

    pub fn set_bound(&mut self, bound: Bound, value: f64) {
        match bound {
            Bound::XMin => self.x_min = Some(value),
            Bound::XMax => self.x_max = Some(value),
            Bound::YMin => self.y_min = Some(value),
            Bound::YMax => self.y_max = Some(value),
        }
    }

    /// Number of elements the shape holds, `None` if it overflows `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }
}

/// Kind of an output variable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VariableKind {
    Scalar,
    Image(ImageOutput),
}

/// Model output record, refreshed after every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputVariable {
    pub name: String,
    pub value: Option<Value>,
    #[serde(flatten)]
    pub kind: VariableKind,
}

impl OutputVariable {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            kind: VariableKind::Scalar,
        }
    }

    pub fn image(name: impl Into<String>, image: ImageOutput) -> Self {
        Self {
            name: name.into(),
            value: None,
            kind: VariableKind::Image(image),
        }
    }

    /// Image fields, if this is an image output.
    pub fn as_image(&self) -> Option<&ImageOutput> {
        match &self.kind {
            VariableKind::Image(image) => Some(image),
            VariableKind::Scalar => None,
        }
    }
}
