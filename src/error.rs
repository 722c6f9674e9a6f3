//! Error types for model evaluation

use ndarray::ShapeError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, AdapterError>;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("feature `{0}` has no prepared input value")]
    MissingFeature(String),
    #[error("output `{0}` is missing from the model output")]
    MissingOutput(String),
    #[error("`{name}` holds {len} elements where a scalar was expected")]
    NotAScalar { name: String, len: usize },
    #[error("zero-dimensional model output cannot be split into `{0}`")]
    NotIndexable(String),
    #[error("cannot reshape `{name}` of {actual} elements into {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: usize,
    },
    #[error("nested array is ragged")]
    RaggedArray,
    #[error("array shaping error: {0}")]
    Shape(#[from] ShapeError),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("model inference failed: {0:#}")]
    Inference(anyhow::Error),
    #[error("duplicate variable `{0}`")]
    DuplicateVariable(String),
}
