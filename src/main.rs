//! Surrogate Evaluator - Main Entry Point
//!
//! Loads an adapter configuration, reads a JSON object of input values from
//! stdin, evaluates the model once and prints the outputs as JSON.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Read;
use surrogate_adapter::{
    config::{AdapterConfig, LoggingConfig},
    InputValue, LinearPredictor, ModelAdapter, Value,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    // stdout carries the evaluation result
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AdapterConfig::load_from_path(&path)
            .with_context(|| format!("Failed to load {}", path))?,
        None => AdapterConfig::load()?,
    };

    init_tracing(&config.logging)?;
    info!("Configuration loaded successfully");

    let predictor = match &config.predictor {
        Some(predictor) => predictor.build()?,
        None => LinearPredictor::identity(config.inputs.len()),
    };
    info!(
        inputs = predictor.input_dim(),
        outputs = predictor.output_dim(),
        "Predictor ready"
    );

    let mut adapter = ModelAdapter::from_config(&config, Box::new(predictor))?;

    let mut payload = String::new();
    std::io::stdin()
        .read_to_string(&mut payload)
        .context("Failed to read inputs from stdin")?;
    let values: HashMap<String, Value> = if payload.trim().is_empty() {
        HashMap::new()
    } else {
        serde_json::from_str(&payload).context("Failed to parse input JSON")?
    };

    let inputs: HashMap<String, InputValue> = values
        .into_iter()
        .map(|(name, value)| {
            let input = InputValue::from_value(&name, value);
            (name, input)
        })
        .collect();

    let evaluation = adapter.evaluate(&inputs)?;
    println!("{}", serde_json::to_string_pretty(&evaluation.to_json()?)?);

    Ok(())
}
