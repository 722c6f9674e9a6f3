use ndarray::{arr1, ArrayD};
use std::collections::HashMap;
use std::io::Write;
use surrogate_adapter::{
    AdapterConfig, AdapterError, InputValue, ModelAdapter, OutputFormat, Predictor, Value,
};

fn identity() -> Box<dyn Predictor> {
    Box::new(|x: ArrayD<f64>| -> anyhow::Result<ArrayD<f64>> { Ok(x) })
}

fn load(contents: &str) -> AdapterConfig {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    AdapterConfig::load_from_path(file.path()).unwrap()
}

#[test]
fn test_adapter_from_config_evaluates() {
    let config = load(
        r#"
[model]
output_format = "raw"
feature_order = ["b", "a"]
output_order = ["second", "first"]

[[inputs]]
name = "a"
default = 1.0

[[inputs]]
name = "b"
default = 2.0

[[outputs]]
name = "first"

[[outputs]]
name = "second"

[[input_transforms]]
kind = "normalize"
mins = [0.0, 0.0]
maxs = [4.0, 2.0]

[[output_transforms]]
kind = "affine"
offset = [0.0, 0.0]
coefficient = [4.0, 2.0]
"#,
    );

    let mut adapter = ModelAdapter::from_config(&config, identity()).unwrap();
    assert_eq!(adapter.output_format(), OutputFormat::Raw);
    assert_eq!(
        adapter.features(),
        Some(&["b".to_string(), "a".to_string()][..])
    );
    assert_eq!(adapter.input_transforms().len(), 1);
    assert_eq!(adapter.output_transforms().len(), 1);

    let mut inputs = HashMap::new();
    inputs.insert("a".to_string(), InputValue::Scalar(1.5));
    let result = adapter.evaluate(&inputs).unwrap();

    // slot 0 carries b, slot 1 carries a
    assert_eq!(result.value("second"), Some(Value::Scalar(2.0)));
    assert_eq!(result.value("first"), Some(Value::Scalar(1.5)));
}

#[test]
fn test_duplicate_config_inputs_rejected() {
    let config = load(
        r#"
[[inputs]]
name = "a"
default = 1.0

[[inputs]]
name = "a"
default = 2.0
"#,
    );

    let result = ModelAdapter::from_config(&config, identity());
    assert!(matches!(result, Err(AdapterError::DuplicateVariable(name)) if name == "a"));
}

#[test]
fn test_json_array_input_reaches_image_output() {
    let config = load(
        r#"
[model]
output_format = "raw"

[[inputs]]
name = "img"
default = [1.0, 2.0]

[[outputs]]
name = "img_out"
type = "image"
shape = [2]
"#,
    );
    let mut adapter = ModelAdapter::from_config(&config, identity()).unwrap();

    let payload: HashMap<String, Value> = serde_json::from_str(r#"{"img": [3.0, 4.0]}"#).unwrap();
    let inputs: HashMap<String, InputValue> = payload
        .into_iter()
        .map(|(name, value)| {
            let input = InputValue::from_value(&name, value);
            (name, input)
        })
        .collect();

    let result = adapter.evaluate(&inputs).unwrap();
    assert_eq!(
        result.value("img_out"),
        Some(Value::Array(arr1(&[3.0, 4.0]).into_dyn()))
    );
}

#[test]
fn test_invalid_transform_in_config_rejected() {
    let config = load(
        r#"
[[inputs]]
name = "a"
default = 1.0

[[input_transforms]]
kind = "affine"
offset = [0.0]
coefficient = [0.0]
"#,
    );

    let result = ModelAdapter::from_config(&config, identity());
    assert!(matches!(result, Err(AdapterError::Transform(_))));
}
