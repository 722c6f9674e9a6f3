//! Surrogate Model Adapter Library
//!
//! Wraps a pre-trained inference function so it can be evaluated through
//! named input variables and returns named output variables, applying
//! reversible transforms on either side of the model call.

pub mod config;
pub mod error;
pub mod models;
pub mod transforms;
pub mod types;

pub use config::AdapterConfig;
pub use error::{AdapterError, Result};
pub use models::{LinearPredictor, ModelAdapter, Predictor, SurrogateModel};
pub use transforms::{AffineTransform, ReversibleTransform};
pub use types::{
    Evaluation, ImageOutput, InputValue, InputVariable, OutputFormat, OutputVariable, Value,
};
