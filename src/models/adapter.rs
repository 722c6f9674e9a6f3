//! Model adapter: named variables in, named variables out

use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};
use crate::models::predictor::Predictor;
use crate::models::surrogate::SurrogateModel;
use crate::transforms::ReversibleTransform;
use crate::types::output::{Evaluation, OutputFormat};
use crate::types::registry::VariableRegistry;
use crate::types::variable::{
    scalar_item, InputValue, InputVariable, OutputVariable, Value, VariableKind,
};
use ndarray::{ArrayD, ArrayViewD, Axis};
use std::collections::HashMap;
use tracing::{debug, info};

/// Wraps a [`Predictor`] behind input and output variable registries.
///
/// Every call to [`ModelAdapter::evaluate`] writes the values it used and
/// produced back into the registries, so they always hold the last evaluated
/// state. Evaluation takes `&mut self`; share an adapter across threads only
/// behind a lock.
pub struct ModelAdapter {
    input_variables: VariableRegistry<InputVariable>,
    output_variables: VariableRegistry<OutputVariable>,
    input_transforms: Vec<Box<dyn ReversibleTransform>>,
    output_transforms: Vec<Box<dyn ReversibleTransform>>,
    predictor: Box<dyn Predictor>,
    output_format: OutputFormat,
    feature_order: Option<Vec<String>>,
    output_order: Option<Vec<String>>,
}

impl ModelAdapter {
    /// Start building an adapter around a predictor.
    pub fn builder(predictor: Box<dyn Predictor>) -> ModelAdapterBuilder {
        ModelAdapterBuilder::new(predictor)
    }

    /// Create an adapter from configuration
    pub fn from_config(config: &AdapterConfig, predictor: Box<dyn Predictor>) -> Result<Self> {
        let input_transforms = config
            .input_transforms
            .iter()
            .map(|spec| spec.build())
            .collect::<Result<Vec<_>>>()?;
        let output_transforms = config
            .output_transforms
            .iter()
            .map(|spec| spec.build())
            .collect::<Result<Vec<_>>>()?;

        let mut builder = Self::builder(predictor)
            .input_variables(config.inputs.clone())
            .output_variables(config.outputs.iter().map(OutputVariable::from))
            .input_transforms(input_transforms)
            .output_transforms(output_transforms)
            .output_format(config.model.output_format);
        if let Some(order) = &config.model.feature_order {
            builder = builder.feature_order(order.clone());
        }
        if let Some(order) = &config.model.output_order {
            builder = builder.output_order(order.clone());
        }
        builder.build()
    }

    /// Configured feature ordering, if any
    pub fn features(&self) -> Option<&[String]> {
        self.feature_order.as_deref()
    }

    /// Configured output ordering, if any
    pub fn outputs(&self) -> Option<&[String]> {
        self.output_order.as_deref()
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn input_transforms(&self) -> &[Box<dyn ReversibleTransform>] {
        &self.input_transforms
    }

    pub fn output_transforms(&self) -> &[Box<dyn ReversibleTransform>] {
        &self.output_transforms
    }

    /// Insert an input transform at `loc`, clamped to the chain length.
    pub fn insert_input_transform(
        &mut self,
        loc: usize,
        mut transform: Box<dyn ReversibleTransform>,
    ) {
        transform.eval();
        let loc = loc.min(self.input_transforms.len());
        self.input_transforms.insert(loc, transform);
    }

    /// Insert an output transform at `loc`, clamped to the chain length.
    pub fn insert_output_transform(
        &mut self,
        loc: usize,
        mut transform: Box<dyn ReversibleTransform>,
    ) {
        transform.eval();
        let loc = loc.min(self.output_transforms.len());
        self.output_transforms.insert(loc, transform);
    }

    /// Evaluate the model on a new set of inputs.
    ///
    /// Inputs missing from `inputs` take their registry default. The result
    /// is packaged according to the adapter's [`OutputFormat`].
    pub fn evaluate(&mut self, inputs: &HashMap<String, InputValue>) -> Result<Evaluation> {
        let input_values = self.prepare_inputs(inputs)?;
        let features = self.arrange_inputs(&input_values)?;
        let features = self.transform_inputs(features)?;
        let raw_output = self
            .predictor
            .predict(features)
            .map_err(AdapterError::Inference)?;
        let output = self.transform_outputs(raw_output)?;
        let parsed = self.parse_outputs(output)?;
        let evaluation = self.prepare_outputs(parsed)?;

        debug!(
            inputs = inputs.len(),
            outputs = evaluation.len(),
            format = ?self.output_format,
            "Evaluation complete"
        );

        Ok(evaluation)
    }

    /// Resolve a value for every registered input, store it in the registry,
    /// and return all registry values as arrays.
    fn prepare_inputs(
        &mut self,
        inputs: &HashMap<String, InputValue>,
    ) -> Result<HashMap<String, ArrayD<f64>>> {
        for variable in self.input_variables.iter_mut() {
            let value = match inputs.get(&variable.name) {
                Some(InputValue::Variable(given)) => given.current().clone(),
                Some(InputValue::Scalar(x)) => Value::Scalar(*x),
                Some(InputValue::Tensor(tensor)) => {
                    Value::Scalar(scalar_item(&variable.name, tensor)?)
                }
                None => {
                    info!(
                        variable = %variable.name,
                        "Input missing from evaluate call, using default value"
                    );
                    variable.default.clone()
                }
            };
            variable.value = Some(value);
        }

        Ok(self
            .input_variables
            .iter()
            .map(|variable| (variable.name.clone(), variable.current().to_array()))
            .collect())
    }

    fn feature_names(&self) -> Vec<&str> {
        match &self.feature_order {
            Some(order) => order.iter().map(String::as_str).collect(),
            None => self.input_variables.names().collect(),
        }
    }

    fn output_names(&self) -> Vec<&str> {
        match &self.output_order {
            Some(order) => order.iter().map(String::as_str).collect(),
            None => self.output_variables.names().collect(),
        }
    }

    /// Stack input values along a new leading axis in feature order.
    fn arrange_inputs(&self, input_values: &HashMap<String, ArrayD<f64>>) -> Result<ArrayD<f64>> {
        let features = self
            .feature_names()
            .into_iter()
            .map(|name| {
                input_values
                    .get(name)
                    .map(|value| value.view())
                    .ok_or_else(|| AdapterError::MissingFeature(name.to_string()))
            })
            .collect::<Result<Vec<ArrayViewD<'_, f64>>>>()?;

        Ok(ndarray::stack(Axis(0), &features)?)
    }

    fn transform_inputs(&self, mut values: ArrayD<f64>) -> Result<ArrayD<f64>> {
        for transform in &self.input_transforms {
            values = transform.transform(values)?;
        }
        Ok(values)
    }

    /// Untransform model outputs back to real units.
    ///
    /// The chain is walked in configured order, not reversed.
    fn transform_outputs(&self, mut values: ArrayD<f64>) -> Result<ArrayD<f64>> {
        for transform in &self.output_transforms {
            values = transform.untransform(values)?;
        }
        Ok(values)
    }

    /// Split the output along its leading axis into named slots.
    fn parse_outputs(&self, output: ArrayD<f64>) -> Result<HashMap<String, ArrayD<f64>>> {
        let names = self.output_names();
        if output.ndim() == 0 {
            return match names.first() {
                Some(name) => Err(AdapterError::NotIndexable(name.to_string())),
                None => Ok(HashMap::new()),
            };
        }

        let len = output.len_of(Axis(0));
        names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                if idx >= len {
                    return Err(AdapterError::MissingOutput(name.to_string()));
                }
                Ok((name.to_string(), output.index_axis(Axis(0), idx).to_owned()))
            })
            .collect()
    }

    /// Write parsed outputs into the output registry and package the result.
    fn prepare_outputs(&mut self, predicted: HashMap<String, ArrayD<f64>>) -> Result<Evaluation> {
        let lookup = |name: &str| {
            predicted
                .get(name)
                .ok_or_else(|| AdapterError::MissingOutput(name.to_string()))
        };

        for variable in self.output_variables.iter_mut() {
            let slot = lookup(&variable.name)?;
            match &mut variable.kind {
                VariableKind::Scalar => {
                    variable.value = Some(Value::Scalar(scalar_item(&variable.name, slot)?));
                }
                VariableKind::Image(image) => {
                    if image.element_count() != Some(slot.len()) {
                        return Err(AdapterError::ShapeMismatch {
                            name: variable.name.clone(),
                            expected: image.shape.clone(),
                            actual: slot.len(),
                        });
                    }
                    let pixels = ArrayD::from_shape_vec(
                        image.shape.clone(),
                        slot.iter().copied().collect(),
                    )?;

                    let bounds = image
                        .bound_references()
                        .map(|(bound, reference)| -> Result<_> {
                            Ok((bound, scalar_item(reference, lookup(reference)?)?))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    for (bound, value) in bounds {
                        image.set_bound(bound, value);
                    }

                    variable.value = Some(Value::Array(pixels));
                }
            }
        }

        Ok(match self.output_format {
            OutputFormat::Tensor => Evaluation::Tensor(predicted),
            OutputFormat::Variable => {
                Evaluation::Variable(self.output_variables.iter().cloned().collect())
            }
            OutputFormat::Raw => Evaluation::Raw(
                self.output_variables
                    .iter()
                    .filter_map(|v| v.value.clone().map(|value| (v.name.clone(), value)))
                    .collect(),
            ),
        })
    }
}

impl SurrogateModel for ModelAdapter {
    fn input_variables(&self) -> &VariableRegistry<InputVariable> {
        &self.input_variables
    }

    fn output_variables(&self) -> &VariableRegistry<OutputVariable> {
        &self.output_variables
    }

    fn evaluate(&mut self, inputs: &HashMap<String, InputValue>) -> Result<Evaluation> {
        ModelAdapter::evaluate(self, inputs)
    }
}

/// Builder for [`ModelAdapter`]
pub struct ModelAdapterBuilder {
    predictor: Box<dyn Predictor>,
    input_variables: Vec<InputVariable>,
    output_variables: Vec<OutputVariable>,
    input_transforms: Vec<Box<dyn ReversibleTransform>>,
    output_transforms: Vec<Box<dyn ReversibleTransform>>,
    output_format: OutputFormat,
    feature_order: Option<Vec<String>>,
    output_order: Option<Vec<String>>,
}

impl ModelAdapterBuilder {
    fn new(predictor: Box<dyn Predictor>) -> Self {
        Self {
            predictor,
            input_variables: Vec::new(),
            output_variables: Vec::new(),
            input_transforms: Vec::new(),
            output_transforms: Vec::new(),
            output_format: OutputFormat::default(),
            feature_order: None,
            output_order: None,
        }
    }

    pub fn input_variables<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = InputVariable>,
    {
        self.input_variables.extend(variables);
        self
    }

    pub fn output_variables<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = OutputVariable>,
    {
        self.output_variables.extend(variables);
        self
    }

    pub fn input_transforms(mut self, transforms: Vec<Box<dyn ReversibleTransform>>) -> Self {
        self.input_transforms = transforms;
        self
    }

    pub fn output_transforms(mut self, transforms: Vec<Box<dyn ReversibleTransform>>) -> Self {
        self.output_transforms = transforms;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Names of the features in the order the predictor consumes them
    pub fn feature_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    /// Names of the outputs in the order the predictor produces them
    pub fn output_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Result<ModelAdapter> {
        let input_variables = VariableRegistry::from_variables(self.input_variables)?;
        let output_variables = VariableRegistry::from_variables(self.output_variables)?;

        let mut predictor = self.predictor;
        predictor.eval();
        let mut input_transforms = self.input_transforms;
        input_transforms.iter_mut().for_each(|t| t.eval());
        let mut output_transforms = self.output_transforms;
        output_transforms.iter_mut().for_each(|t| t.eval());

        info!(
            inputs = input_variables.len(),
            outputs = output_variables.len(),
            input_transforms = input_transforms.len(),
            output_transforms = output_transforms.len(),
            format = ?self.output_format,
            "Model adapter initialized"
        );

        Ok(ModelAdapter {
            input_variables,
            output_variables,
            input_transforms,
            output_transforms,
            predictor,
            output_format: self.output_format,
            feature_order: self.feature_order,
            output_order: self.output_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, IxDyn};

    fn identity() -> Box<dyn Predictor> {
        Box::new(|x: ArrayD<f64>| -> anyhow::Result<ArrayD<f64>> { Ok(x) })
    }

    fn scalar(x: f64) -> ArrayD<f64> {
        ArrayD::from_elem(IxDyn(&[]), x)
    }

    fn adapter() -> ModelAdapter {
        ModelAdapter::builder(identity())
            .input_variables(vec![InputVariable::new("a", 1.0), InputVariable::new("b", 2.0)])
            .output_variables(vec![OutputVariable::scalar("y1"), OutputVariable::scalar("y2")])
            .build()
            .unwrap()
    }

    #[test]
    fn test_arrange_uses_feature_order() {
        let adapter = ModelAdapter::builder(identity())
            .input_variables(vec![InputVariable::new("a", 1.0), InputVariable::new("b", 2.0)])
            .feature_order(["b", "a"])
            .build()
            .unwrap();

        let mut values = HashMap::new();
        values.insert("a".to_string(), scalar(1.0));
        values.insert("b".to_string(), scalar(2.0));

        let arranged = adapter.arrange_inputs(&values).unwrap();
        assert_eq!(arranged, arr1(&[2.0, 1.0]).into_dyn());
    }

    #[test]
    fn test_arrange_falls_back_to_registry_order() {
        let adapter = adapter();
        let mut values = HashMap::new();
        values.insert("b".to_string(), scalar(20.0));
        values.insert("a".to_string(), scalar(10.0));

        let arranged = adapter.arrange_inputs(&values).unwrap();
        assert_eq!(arranged, arr1(&[10.0, 20.0]).into_dyn());
    }

    #[test]
    fn test_arrange_missing_feature() {
        let adapter = adapter();
        let mut values = HashMap::new();
        values.insert("a".to_string(), scalar(1.0));

        assert!(matches!(
            adapter.arrange_inputs(&values),
            Err(AdapterError::MissingFeature(name)) if name == "b"
        ));
    }

    #[test]
    fn test_parse_outputs_by_position() {
        let adapter = adapter();
        let parsed = adapter.parse_outputs(arr1(&[5.0, 6.0]).into_dyn()).unwrap();

        assert_eq!(parsed["y1"], scalar(5.0));
        assert_eq!(parsed["y2"], scalar(6.0));
    }

    #[test]
    fn test_parse_outputs_too_short() {
        let adapter = adapter();
        assert!(matches!(
            adapter.parse_outputs(arr1(&[5.0]).into_dyn()),
            Err(AdapterError::MissingOutput(name)) if name == "y2"
        ));
        assert!(matches!(
            adapter.parse_outputs(scalar(5.0)),
            Err(AdapterError::NotIndexable(_))
        ));
    }

    #[test]
    fn test_prepare_inputs_records_values() {
        let mut adapter = adapter();
        let mut inputs = HashMap::new();
        inputs.insert("a".to_string(), InputValue::Tensor(arr1(&[4.0]).into_dyn()));

        let prepared = adapter.prepare_inputs(&inputs).unwrap();

        assert_eq!(prepared["a"], scalar(4.0));
        assert_eq!(prepared["b"], scalar(2.0));
        assert_eq!(
            adapter.input_variables.get("a").unwrap().value,
            Some(Value::Scalar(4.0))
        );
    }

    #[test]
    fn test_prepare_inputs_rejects_multi_element_tensor() {
        let mut adapter = adapter();
        let mut inputs = HashMap::new();
        inputs.insert("a".to_string(), InputValue::Tensor(arr1(&[1.0, 2.0]).into_dyn()));

        assert!(matches!(
            adapter.prepare_inputs(&inputs),
            Err(AdapterError::NotAScalar { len: 2, .. })
        ));
    }

    #[test]
    fn test_insert_transform_clamps_location() {
        let mut adapter = adapter();
        let transform =
            crate::transforms::AffineTransform::new(vec![0.0; 2], vec![1.0; 2]).unwrap();

        adapter.insert_output_transform(10, Box::new(transform.clone()));
        adapter.insert_input_transform(0, Box::new(transform));

        assert_eq!(adapter.output_transforms().len(), 1);
        assert_eq!(adapter.input_transforms().len(), 1);
    }
}
