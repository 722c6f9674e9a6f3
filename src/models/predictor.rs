//! Inference backends

use anyhow::{anyhow, ensure, Context, Result};
use ndarray::{Array1, Array2, ArrayD, Ix1};
use tracing::info;

/// Opaque inference function from an ordered feature tensor to an ordered
/// output tensor.
pub trait Predictor: Send + Sync {
    /// Run one synchronous forward pass.
    fn predict(&self, features: ArrayD<f64>) -> Result<ArrayD<f64>>;

    /// Switch to inference mode. Called once by the adapter at construction.
    fn eval(&mut self) {}
}

impl<F> Predictor for F
where
    F: Fn(ArrayD<f64>) -> Result<ArrayD<f64>> + Send + Sync,
{
    fn predict(&self, features: ArrayD<f64>) -> Result<ArrayD<f64>> {
        self(features)
    }
}

/// Dense layer `y = W x + b` over a flat feature vector.
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    weight: Array2<f64>, // out x in
    bias: Array1<f64>,
}

impl LinearPredictor {
    /// Create from row-major weights (one row per output) and optional bias.
    pub fn new(weights: Vec<Vec<f64>>, bias: Option<Vec<f64>>) -> Result<Self> {
        let rows = weights.len();
        let cols = weights.first().map(Vec::len).unwrap_or(0);
        ensure!(
            weights.iter().all(|row| row.len() == cols),
            "weight rows must all have {} columns",
            cols
        );

        let weight = Array2::from_shape_vec((rows, cols), weights.into_iter().flatten().collect())
            .context("Failed to build weight matrix")?;
        let bias = match bias {
            Some(bias) => {
                ensure!(
                    bias.len() == rows,
                    "bias has {} entries for {} outputs",
                    bias.len(),
                    rows
                );
                Array1::from(bias)
            }
            None => Array1::zeros(rows),
        };

        info!(inputs = cols, outputs = rows, "Linear predictor initialized");

        Ok(Self { weight, bias })
    }

    /// Predictor that returns its input unchanged.
    pub fn identity(dim: usize) -> Self {
        Self {
            weight: Array2::eye(dim),
            bias: Array1::zeros(dim),
        }
    }

    pub fn input_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.weight.nrows()
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, features: ArrayD<f64>) -> Result<ArrayD<f64>> {
        let shape = features.shape().to_vec();
        let x = features.into_dimensionality::<Ix1>().map_err(|_| {
            anyhow!(
                "linear predictor expects a flat feature vector, got shape {:?}",
                shape
            )
        })?;
        ensure!(
            x.len() == self.input_dim(),
            "linear predictor expects {} features, got {}",
            self.input_dim(),
            x.len()
        );

        Ok((self.weight.dot(&x) + &self.bias).into_dyn())
    }
}
