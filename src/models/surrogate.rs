//! Common interface of surrogate models

use crate::error::Result;
use crate::types::output::Evaluation;
use crate::types::registry::VariableRegistry;
use crate::types::variable::{InputValue, InputVariable, OutputVariable};
use std::collections::HashMap;

/// A model evaluated through named input and output variables.
pub trait SurrogateModel {
    /// Registered inputs, holding the values of the last evaluation
    fn input_variables(&self) -> &VariableRegistry<InputVariable>;

    /// Registered outputs, holding the results of the last evaluation
    fn output_variables(&self) -> &VariableRegistry<OutputVariable>;

    /// Evaluate the model on new input values.
    fn evaluate(&mut self, inputs: &HashMap<String, InputValue>) -> Result<Evaluation>;
}
