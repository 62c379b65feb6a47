//! # Spread graphs
//!
//! A spread graph is a provenance DAG rebuilt from the markers of a run.
//! Each node stands for one original vertex at one pulse; each edge says
//! "this activation travelled along that original edge".
//!
//! ```text
//! original:  A ──▶ B ──▶ C          spread graph (pulses 0..=2):
//!                                    (A,0) ──▶ (B,1) ──▶ (C,2)
//!                                      │         └────▶ (A,2)
//!                                      └──────────────▶ (B,2)
//! ```
//!
//! Nodes carry two properties: the original vertex id and the pulse. Edges
//! carry the original edge id. Property names come from `SpreadGraphKeys`.
//!
//! `Generation` builds a spread graph from an `ExecutionResult`;
//! `RelevantMinimization` cuts one down to the ancestors of a single vertex.

pub mod generation;
pub mod minimization;
pub mod transformation;

pub use generation::Generation;
pub use minimization::RelevantMinimization;
pub use transformation::Transformation;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::{Direction, Edge, EdgeId, Value, VertexId};
use crate::storage::{GraphStore, PropertyPredicate};
use crate::{Error, Result};

/// Property names used on spread graph elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadGraphKeys {
    pub pulse: String,
    pub original: String,
}

impl Default for SpreadGraphKeys {
    fn default() -> Self {
        Self {
            pulse: "pulse".to_string(),
            original: "original".to_string(),
        }
    }
}

/// Handle over a graph holding a spread graph.
#[derive(Clone)]
pub struct SpreadGraph {
    graph: Arc<dyn GraphStore>,
    start_pulse: u32,
    end_pulse: u32,
    keys: SpreadGraphKeys,
}

impl SpreadGraph {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        start_pulse: u32,
        end_pulse: u32,
        keys: SpreadGraphKeys,
    ) -> Self {
        Self { graph, start_pulse, end_pulse, keys }
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    pub fn start_pulse(&self) -> u32 {
        self.start_pulse
    }

    pub fn end_pulse(&self) -> u32 {
        self.end_pulse
    }

    pub fn keys(&self) -> &SpreadGraphKeys {
        &self.keys
    }

    /// Nodes standing for `original`, at any pulse.
    pub fn vertices_of(&self, original: VertexId) -> Result<Vec<VertexId>> {
        self.graph.vertices_where(&PropertyPredicate::equals(
            self.keys.original.as_str(),
            Value::Vertex(original),
        ))
    }

    /// Nodes at `pulse`.
    pub fn vertices_at(&self, pulse: u32) -> Result<Vec<VertexId>> {
        self.graph
            .vertices_where(&PropertyPredicate::equals(self.keys.pulse.as_str(), pulse))
    }

    /// The node for `original` at `pulse`, if any.
    pub fn vertex_at(&self, pulse: u32, original: VertexId) -> Result<Option<VertexId>> {
        let predicate = PropertyPredicate::And(vec![
            PropertyPredicate::equals(self.keys.original.as_str(), Value::Vertex(original)),
            PropertyPredicate::equals(self.keys.pulse.as_str(), pulse),
        ]);
        Ok(self.graph.vertices_where(&predicate)?.into_iter().next())
    }

    /// Nodes without incoming edges.
    pub fn start_vertices(&self) -> Result<Vec<VertexId>> {
        self.vertices_without(Direction::Incoming)
    }

    /// Nodes without outgoing edges.
    pub fn end_vertices(&self) -> Result<Vec<VertexId>> {
        self.vertices_without(Direction::Outgoing)
    }

    fn vertices_without(&self, dir: Direction) -> Result<Vec<VertexId>> {
        let mut found = Vec::new();
        for id in self.graph.vertex_ids()? {
            if self.graph.incident_edges(id, dir)?.is_empty() {
                found.push(id);
            }
        }
        Ok(found)
    }

    pub fn pulse_of(&self, node: VertexId) -> Result<u32> {
        self.graph
            .vertex_property(node, &self.keys.pulse)?
            .and_then(|v| v.as_int())
            .and_then(|p| u32::try_from(p).ok())
            .ok_or_else(|| Error::NotFound(format!("pulse of spread graph node {node}")))
    }

    pub fn original_of(&self, node: VertexId) -> Result<VertexId> {
        self.graph
            .vertex_property(node, &self.keys.original)?
            .and_then(|v| v.as_vertex())
            .ok_or_else(|| Error::NotFound(format!("original of spread graph node {node}")))
    }

    pub fn original_edge_of(&self, edge: EdgeId) -> Result<EdgeId> {
        self.graph
            .edge_property(edge, &self.keys.original)?
            .and_then(|v| v.as_edge())
            .ok_or_else(|| Error::NotFound(format!("original of spread graph edge {edge}")))
    }

    /// Provenance edges arriving at `node`.
    pub fn in_edges(&self, node: VertexId) -> Result<Vec<Edge>> {
        self.graph.incident_edges(node, Direction::Incoming)
    }
}

impl fmt::Debug for SpreadGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpreadGraph")
            .field("start_pulse", &self.start_pulse)
            .field("end_pulse", &self.end_pulse)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// `(original, pulse) → node` lookup for the graph being built.
#[derive(Debug, Default)]
pub(crate) struct NodeIndex {
    by_original: HashMap<VertexId, BTreeMap<u32, VertexId>>,
}

impl NodeIndex {
    pub(crate) fn get(&self, original: VertexId, pulse: u32) -> Option<VertexId> {
        self.by_original.get(&original)?.get(&pulse).copied()
    }

    /// Most recent node for `original` at or before `pulse`.
    pub(crate) fn latest(&self, original: VertexId, pulse: u32) -> Option<VertexId> {
        self.by_original
            .get(&original)?
            .range(..=pulse)
            .next_back()
            .map(|(_, node)| *node)
    }

    pub(crate) fn insert(&mut self, original: VertexId, pulse: u32, node: VertexId) {
        self.by_original.entry(original).or_default().insert(pulse, node);
    }

    pub(crate) fn len(&self) -> usize {
        self.by_original.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_index_latest() {
        let mut index = NodeIndex::default();
        index.insert(VertexId(1), 0, VertexId(10));
        index.insert(VertexId(1), 2, VertexId(12));
        index.insert(VertexId(2), 1, VertexId(21));

        assert_eq!(index.get(VertexId(1), 2), Some(VertexId(12)));
        assert_eq!(index.get(VertexId(1), 1), None);
        assert_eq!(index.latest(VertexId(1), 1), Some(VertexId(10)));
        assert_eq!(index.latest(VertexId(1), 5), Some(VertexId(12)));
        assert_eq!(index.latest(VertexId(2), 0), None);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_default_keys() {
        let keys = SpreadGraphKeys::default();
        assert_eq!(keys.pulse, "pulse");
        assert_eq!(keys.original, "original");
    }
}
