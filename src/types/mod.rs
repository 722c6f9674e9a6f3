//! Type definitions for the surrogate model adapter

pub mod output;
pub mod registry;
pub mod variable;

pub use output::{Evaluation, OutputFormat};
pub use registry::{Named, VariableRegistry};
pub use variable::{
    Bound, ImageOutput, InputValue, InputVariable, OutputVariable, Value, VariableKind,
};
