//! Configuration management for the surrogate model adapter

use crate::error::Result as AdapterResult;
use crate::models::predictor::LinearPredictor;
use crate::transforms::{AffineTransform, ReversibleTransform};
use crate::types::output::OutputFormat;
use crate::types::variable::{ImageOutput, InputVariable, OutputVariable, VariableKind};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main adapter configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub model: ModelConfig,
    /// Input variables in feature order unless `model.feature_order` is set
    #[serde(default)]
    pub inputs: Vec<InputVariable>,
    /// Output variables in output order unless `model.output_order` is set
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    #[serde(default)]
    pub input_transforms: Vec<TransformSpec>,
    #[serde(default)]
    pub output_transforms: Vec<TransformSpec>,
    /// Weights of the bundled linear predictor
    #[serde(default)]
    pub predictor: Option<PredictorConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Evaluation settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    /// Packaging of evaluate results: raw, string, tensor or variable
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Feature names in the order the model consumes them
    #[serde(default)]
    pub feature_order: Option<Vec<String>>,
    /// Output names in the order the model produces them
    #[serde(default)]
    pub output_order: Option<Vec<String>>,
}

/// Output kind as written in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Scalar,
    Image,
}

/// Output variable declaration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: OutputKind,
    /// Image shape, ignored for scalars
    #[serde(default)]
    pub shape: Vec<usize>,
    #[serde(default)]
    pub x_min_variable: Option<String>,
    #[serde(default)]
    pub x_max_variable: Option<String>,
    #[serde(default)]
    pub y_min_variable: Option<String>,
    #[serde(default)]
    pub y_max_variable: Option<String>,
}

impl From<&OutputSpec> for OutputVariable {
    fn from(spec: &OutputSpec) -> Self {
        let kind = match spec.kind {
            OutputKind::Scalar => VariableKind::Scalar,
            OutputKind::Image => VariableKind::Image(ImageOutput {
                shape: spec.shape.clone(),
                x_min_variable: spec.x_min_variable.clone(),
                x_max_variable: spec.x_max_variable.clone(),
                y_min_variable: spec.y_min_variable.clone(),
                y_max_variable: spec.y_max_variable.clone(),
                ..Default::default()
            }),
        };
        OutputVariable {
            name: spec.name.clone(),
            value: None,
            kind,
        }
    }
}

/// Transform declaration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransformSpec {
    /// `(x - offset) / coefficient` per feature
    Affine {
        offset: Vec<f64>,
        coefficient: Vec<f64>,
    },
    /// Min-max scaling to the unit interval
    Normalize { mins: Vec<f64>, maxs: Vec<f64> },
}

impl TransformSpec {
    pub fn build(&self) -> AdapterResult<Box<dyn ReversibleTransform>> {
        let transform = match self {
            TransformSpec::Affine {
                offset,
                coefficient,
            } => AffineTransform::new(offset.clone(), coefficient.clone())?,
            TransformSpec::Normalize { mins, maxs } => {
                AffineTransform::normalize(mins.clone(), maxs.clone())?
            }
        };
        Ok(Box::new(transform))
    }
}

/// Linear predictor weights
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// One row per output
    pub weights: Vec<Vec<f64>>,
    #[serde(default)]
    pub bias: Option<Vec<f64>>,
}

impl PredictorConfig {
    pub fn build(&self) -> Result<LinearPredictor> {
        LinearPredictor::new(self.weights.clone(), self.bias.clone())
            .context("Invalid predictor configuration")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AdapterConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
