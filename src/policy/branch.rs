//! Built-in branch (fan-out discount) modes.

use serde::{Deserialize, Serialize};

use super::{BranchMode, Context};
use crate::model::{Direction, VertexId};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Branch {
    /// No discount.
    #[default]
    None,
    /// `1 / incident edge count`, 0 for an isolated vertex.
    Degree,
    /// `distinct neighbours / total vertices`.
    FanOut,
    /// `1 / max(1, edges the send mode allows)`.
    AllowedEdges,
}

impl BranchMode for Branch {
    fn branch(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64> {
        let graph = ctx.graph();
        match self {
            Branch::None => Ok(1.0),
            Branch::Degree => {
                let degree = graph.incident_edges(vertex, Direction::Both)?.len();
                Ok(if degree == 0 { 0.0 } else { 1.0 / degree as f64 })
            }
            Branch::FanOut => {
                let total = graph.vertex_count()?;
                if total == 0 {
                    return Ok(0.0);
                }
                let adjacent = graph.adjacent_vertices(vertex, Direction::Both)?.len();
                Ok(adjacent as f64 / total as f64)
            }
            Branch::AllowedEdges => {
                let allowed = ctx.allowed_edges(vertex)?.len();
                Ok(1.0 / (allowed.max(1) as f64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyMap;
    use crate::policy::tests::Fixture;
    use crate::storage::GraphStore;

    #[test]
    fn test_degree() {
        let fx = Fixture::chain();
        let lonely = fx.graph.add_vertex("Node", PropertyMap::new()).unwrap();
        let ctx = fx.ctx(1);
        assert_eq!(Branch::Degree.branch(&ctx, fx.b).unwrap(), 0.5);
        assert_eq!(Branch::Degree.branch(&ctx, fx.a).unwrap(), 1.0);
        assert_eq!(Branch::Degree.branch(&ctx, lonely).unwrap(), 0.0);
    }

    #[test]
    fn test_fan_out_is_fractional() {
        let fx = Fixture::chain();
        let ctx = fx.ctx(1);
        assert!((Branch::FanOut.branch(&ctx, fx.b).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((Branch::FanOut.branch(&ctx, fx.a).unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_allowed_edges_never_divides_by_zero() {
        let fx = Fixture::chain();
        let lonely = fx.graph.add_vertex("Node", PropertyMap::new()).unwrap();
        let ctx = fx.ctx(1);
        assert_eq!(Branch::AllowedEdges.branch(&ctx, fx.b).unwrap(), 0.5);
        assert_eq!(Branch::AllowedEdges.branch(&ctx, lonely).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_vertex_propagates() {
        let fx = Fixture::chain();
        let ctx = fx.ctx(1);
        assert!(Branch::Degree.branch(&ctx, VertexId(999)).is_err());
        assert_eq!(Branch::None.branch(&ctx, VertexId(999)).unwrap(), 1.0);
    }
}
