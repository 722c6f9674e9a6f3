//! Reversible transforms applied around the inference call

use crate::error::{AdapterError, Result};
use ndarray::{Array1, ArrayD, IxDyn};
use std::fmt::Debug;

/// A mapping with an inverse, used to normalize model inputs and denormalize
/// model outputs.
pub trait ReversibleTransform: Debug + Send + Sync {
    /// Forward mapping.
    fn transform(&self, values: ArrayD<f64>) -> Result<ArrayD<f64>>;

    /// Inverse of [`ReversibleTransform::transform`].
    fn untransform(&self, values: ArrayD<f64>) -> Result<ArrayD<f64>>;

    /// Freeze any learned state before inference. Called once when the
    /// transform is attached to an adapter.
    fn eval(&mut self) {}
}

/// Per-feature affine transform: `(x - offset) / coefficient`.
///
/// Parameters apply along the leading (feature) axis, so a stacked input of
/// shape `[d, ...]` needs `d` offsets and coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    offset: Array1<f64>,
    coefficient: Array1<f64>,
}

impl AffineTransform {
    pub fn new(offset: Vec<f64>, coefficient: Vec<f64>) -> Result<Self> {
        if offset.len() != coefficient.len() {
            return Err(AdapterError::Transform(format!(
                "{} offsets but {} coefficients",
                offset.len(),
                coefficient.len()
            )));
        }
        if let Some(idx) = coefficient.iter().position(|&c| c == 0.0) {
            return Err(AdapterError::Transform(format!(
                "coefficient {} is zero",
                idx
            )));
        }
        Ok(Self {
            offset: Array1::from(offset),
            coefficient: Array1::from(coefficient),
        })
    }

    /// Min-max normalization to the unit interval.
    pub fn normalize(mins: Vec<f64>, maxs: Vec<f64>) -> Result<Self> {
        if mins.len() != maxs.len() {
            return Err(AdapterError::Transform(format!(
                "{} lower bounds but {} upper bounds",
                mins.len(),
                maxs.len()
            )));
        }
        let coefficient = mins.iter().zip(&maxs).map(|(lo, hi)| hi - lo).collect();
        Self::new(mins, coefficient)
    }

    pub fn dim(&self) -> usize {
        self.offset.len()
    }

    /// Reshape a parameter vector to `[d, 1, ..., 1]` so it broadcasts
    /// against `values`.
    fn along_leading(&self, params: &Array1<f64>, values: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        let leading = values.shape().first().copied();
        if leading != Some(self.dim()) {
            return Err(AdapterError::Transform(format!(
                "expected {} features along the leading axis, got shape {:?}",
                self.dim(),
                values.shape()
            )));
        }
        let mut shape = vec![1; values.ndim()];
        shape[0] = self.dim();
        Ok(params.clone().into_shape(IxDyn(&shape))?)
    }
}

impl ReversibleTransform for AffineTransform {
    fn transform(&self, values: ArrayD<f64>) -> Result<ArrayD<f64>> {
        let offset = self.along_leading(&self.offset, &values)?;
        let coefficient = self.along_leading(&self.coefficient, &values)?;
        Ok((values - &offset) / &coefficient)
    }

    fn untransform(&self, values: ArrayD<f64>) -> Result<ArrayD<f64>> {
        let offset = self.along_leading(&self.offset, &values)?;
        let coefficient = self.along_leading(&self.coefficient, &values)?;
        Ok(values * &coefficient + &offset)
    }
}
