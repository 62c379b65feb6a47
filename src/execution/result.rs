//! Read-only view over the markers a run left on the graph.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::keys::{is_valid_activation, PropertyKeys};
use crate::model::{Value, VertexId};
use crate::spreadgraph::Generation;
use crate::storage::{GraphStore, PropertyPredicate};
use crate::Result;

/// Outcome of `Execution::run`.
///
/// Holds no activation itself: every accessor reads the graph, so the view
/// stays valid until `cleanup` removes the markers.
#[derive(Clone)]
pub struct ExecutionResult {
    graph: Arc<dyn GraphStore>,
    keys: PropertyKeys,
    pulse: u32,
    written_through: u32,
}

impl ExecutionResult {
    pub(crate) fn new(
        graph: Arc<dyn GraphStore>,
        keys: PropertyKeys,
        pulse: u32,
        written_through: u32,
    ) -> Self {
        Self { graph, keys, pulse, written_through }
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    pub fn keys(&self) -> &PropertyKeys {
        &self.keys
    }

    /// Last fully computed pulse.
    pub fn pulse(&self) -> u32 {
        self.pulse
    }

    /// Vertex activation at `pulse`, 0 when absent.
    pub fn activation(&self, vertex: VertexId, pulse: u32) -> Result<f64> {
        Ok(self
            .graph
            .vertex_property(vertex, &self.keys.vertex_activation(pulse))?
            .and_then(|v| v.as_float())
            .unwrap_or(0.0))
    }

    pub fn activation_now(&self, vertex: VertexId) -> Result<f64> {
        self.activation(vertex, self.pulse)
    }

    /// Vertices holding activation at `pulse`, strongest first.
    pub fn activated_vertices(&self, pulse: u32) -> Result<Vec<(VertexId, f64)>> {
        let key = self.keys.vertex_activation(pulse);
        self.graph
            .vertices_ordered_by(&key, &PropertyPredicate::exists(key.as_str()))
    }

    /// Like `activated_vertices`, keeping only activation `>= min`.
    pub fn activated_vertices_above(&self, pulse: u32, min: f64) -> Result<Vec<(VertexId, f64)>> {
        let key = self.keys.vertex_activation(pulse);
        self.graph
            .vertices_ordered_by(&key, &PropertyPredicate::gte(key.as_str(), min))
    }

    pub fn activated_vertices_now(&self) -> Result<Vec<(VertexId, f64)>> {
        self.activated_vertices(self.pulse)
    }

    /// Write `Σ_p vertex_activation[p] * lambda^p` over pulses `0..=pulse`
    /// into `target_key` of every vertex with a valid sum. Returns the number
    /// of vertices written.
    pub fn accumulate_activations(&self, target_key: &str, lambda: f64) -> Result<usize> {
        let keys: Vec<String> = (0..=self.pulse)
            .map(|p| self.keys.vertex_activation(p))
            .collect();
        let touched = PropertyPredicate::Or(
            keys.iter().map(|k| PropertyPredicate::exists(k.as_str())).collect(),
        );

        let mut written = 0;
        for vertex in self.graph.vertices_where(&touched)? {
            let mut total = 0.0;
            for (p, key) in keys.iter().enumerate() {
                let Some(activation) = self.graph.vertex_property(vertex, key)?.and_then(|v| v.as_float())
                else {
                    continue;
                };
                total += if lambda == 1.0 {
                    activation
                } else {
                    activation * lambda.powi(p as i32)
                };
            }
            if is_valid_activation(total) {
                self.graph.set_vertex_property(vertex, target_key, Value::Float(total))?;
                written += 1;
            }
        }
        debug!(target_key, lambda, written, "accumulated activations");
        Ok(written)
    }

    /// Remove every marker of the run, the seed included. Returns the number
    /// of properties removed.
    pub fn cleanup(&self) -> Result<usize> {
        let removed = self
            .graph
            .remove_vertex_properties(&self.keys.vertex_keys(self.written_through))?
            + self
                .graph
                .remove_edge_properties(&self.keys.edge_keys(self.written_through))?;
        debug!(prefix = self.keys.prefix(), removed, "removed activation markers");
        Ok(removed)
    }

    /// Builder for the spread graph of this run.
    pub fn generate_spread_graph(&self) -> Generation {
        Generation::new(self.clone())
    }
}

impl fmt::Debug for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionResult")
            .field("prefix", &self.keys.prefix())
            .field("pulse", &self.pulse)
            .field("written_through", &self.written_through)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyMap;
    use crate::storage::MemoryGraph;

    fn seeded() -> (MemoryGraph, ExecutionResult, VertexId, VertexId) {
        let graph = MemoryGraph::new();
        let a = graph.add_vertex("Node", PropertyMap::new()).unwrap();
        let b = graph.add_vertex("Node", PropertyMap::new()).unwrap();
        let keys = PropertyKeys::new("r");
        for p in 0..=2 {
            graph.set_vertex_property(a, &keys.vertex_activation(p), Value::Float(10.0)).unwrap();
        }
        graph.set_vertex_property(b, &keys.vertex_activation(2), Value::Float(4.0)).unwrap();
        graph.set_vertex_property(b, &keys.input_activation(2), Value::Float(4.0)).unwrap();
        let result = ExecutionResult::new(Arc::new(graph.clone()), keys, 2, 2);
        (graph, result, a, b)
    }

    #[test]
    fn test_activation_lookup() {
        let (_, result, a, b) = seeded();
        assert_eq!(result.activation(a, 1).unwrap(), 10.0);
        assert_eq!(result.activation(b, 1).unwrap(), 0.0);
        assert_eq!(result.activation_now(b).unwrap(), 4.0);
    }

    #[test]
    fn test_ranking() {
        let (_, result, a, b) = seeded();
        assert_eq!(result.activated_vertices_now().unwrap(), vec![(a, 10.0), (b, 4.0)]);
        assert_eq!(result.activated_vertices(1).unwrap(), vec![(a, 10.0)]);
        assert_eq!(result.activated_vertices_above(2, 5.0).unwrap(), vec![(a, 10.0)]);
    }

    #[test]
    fn test_accumulate() {
        let (graph, result, a, b) = seeded();
        assert_eq!(result.accumulate_activations("total", 1.0).unwrap(), 2);
        assert_eq!(graph.vertex_property(a, "total").unwrap(), Some(Value::Float(30.0)));

        result.accumulate_activations("decayed", 0.5).unwrap();
        assert_eq!(graph.vertex_property(a, "decayed").unwrap(), Some(Value::Float(17.5)));
        assert_eq!(graph.vertex_property(b, "decayed").unwrap(), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_cleanup_removes_markers_only() {
        let (graph, result, a, b) = seeded();
        graph.set_vertex_property(a, "name", Value::from("a")).unwrap();
        assert_eq!(result.cleanup().unwrap(), 5);
        assert!(result.activated_vertices(0).unwrap().is_empty());
        assert_eq!(graph.vertex_property(a, "name").unwrap(), Some(Value::from("a")));
        assert_eq!(graph.vertex_property(b, &result.keys().input_activation(2)).unwrap(), None);
    }
}
