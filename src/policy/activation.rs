//! Built-in activation functions.

use serde::{Deserialize, Serialize};

use super::{ActivationMode, Context};
use crate::model::VertexId;
use crate::Result;

/// Squashing functions. Results outside `(0, ∞)` are discarded by the
/// engine, so none of these need to guard their domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActivationFunction {
    #[default]
    Identity,
    /// `2 * (1 / (1 + e^-x) - 0.5)`, bounded to `(-1, 1)`.
    Sigmoid,
    /// `log2(x + 1)`
    Log2,
    /// `log10(x + 1)`
    Log10,
    /// `Log2` then `Sigmoid`.
    Log2Sigmoid,
    /// `Log10` then `Sigmoid`.
    Log10Sigmoid,
}

impl ActivationFunction {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Log2 => (x + 1.0).log2(),
            ActivationFunction::Log10 => (x + 1.0).log10(),
            ActivationFunction::Log2Sigmoid => sigmoid((x + 1.0).log2()),
            ActivationFunction::Log10Sigmoid => sigmoid((x + 1.0).log10()),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    2.0 * (1.0 / (1.0 + (-x).exp()) - 0.5)
}

impl ActivationMode for ActivationFunction {
    fn activation(&self, _ctx: &Context<'_>, _vertex: VertexId, x: f64) -> Result<f64> {
        Ok(self.apply(x))
    }
}
