//! Constant edge weight.

use serde::{Deserialize, Serialize};

use super::{Context, EdgeWeight};
use crate::model::Edge;
use crate::Result;

/// Every edge scales by the same factor in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantWeight(pub f64);

impl Default for ConstantWeight {
    fn default() -> Self {
        Self(1.0)
    }
}

impl EdgeWeight for ConstantWeight {
    fn weight(&self, _ctx: &Context<'_>, _edge: &Edge, _with_direction: bool) -> Result<f64> {
        Ok(self.0)
    }
}
