//! Surrogate model components

pub mod adapter;
pub mod predictor;
pub mod surrogate;

pub use adapter::{ModelAdapter, ModelAdapterBuilder};
pub use predictor::{LinearPredictor, Predictor};
pub use surrogate::SurrogateModel;
