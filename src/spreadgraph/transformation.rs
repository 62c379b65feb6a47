//! Shared settings and output writer for spread graph transformations.
//!
//! A transformation reads one spread graph and writes a derived one. Nodes
//! keep the source node's label, original id and pulse; edges keep the
//! source edge's label and original id.

use std::sync::Arc;

use super::{NodeIndex, SpreadGraph, SpreadGraphKeys};
use crate::model::{props, Edge, EdgeId, Value, VertexId};
use crate::storage::{GraphStore, MemoryGraph};
use crate::{Error, Result};

/// Pulse window, output graph and key names of a transformation. Defaults
/// to the source's window, a fresh `MemoryGraph` and default keys.
#[derive(Clone)]
pub struct Transformation {
    source: SpreadGraph,
    start_pulse: u32,
    end_pulse: u32,
    into: Option<Arc<dyn GraphStore>>,
    keys: SpreadGraphKeys,
}

impl Transformation {
    pub fn new(source: &SpreadGraph) -> Self {
        Self {
            source: source.clone(),
            start_pulse: source.start_pulse(),
            end_pulse: source.end_pulse(),
            into: None,
            keys: SpreadGraphKeys::default(),
        }
    }

    pub fn start_pulse(mut self, pulse: u32) -> Self {
        self.start_pulse = pulse;
        self
    }

    pub fn end_pulse(mut self, pulse: u32) -> Self {
        self.end_pulse = pulse;
        self
    }

    pub fn into<G: GraphStore>(self, graph: G) -> Self {
        self.into_shared(Arc::new(graph))
    }

    pub fn into_shared(mut self, graph: Arc<dyn GraphStore>) -> Self {
        self.into = Some(graph);
        self
    }

    pub fn keys(mut self, keys: SpreadGraphKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn source(&self) -> &SpreadGraph {
        &self.source
    }

    pub fn window(&self) -> (u32, u32) {
        (self.start_pulse, self.end_pulse)
    }

    pub(crate) fn writer(&self) -> TransformationWriter<'_> {
        let target = self
            .into
            .clone()
            .unwrap_or_else(|| Arc::new(MemoryGraph::new()));
        TransformationWriter {
            source: &self.source,
            target: SpreadGraph::new(target, self.start_pulse, self.end_pulse, self.keys.clone()),
            nodes: NodeIndex::default(),
        }
    }
}

pub(crate) struct TransformationWriter<'a> {
    source: &'a SpreadGraph,
    target: SpreadGraph,
    nodes: NodeIndex,
}

impl TransformationWriter<'_> {
    /// Output node standing for the same `(original, pulse)` as `source_node`.
    pub(crate) fn node(&self, source_node: VertexId) -> Result<Option<VertexId>> {
        let original = self.source.original_of(source_node)?;
        let pulse = self.source.pulse_of(source_node)?;
        Ok(self.nodes.get(original, pulse))
    }

    /// Copy `source_node` into the output.
    pub(crate) fn add_node(&mut self, source_node: VertexId) -> Result<VertexId> {
        let original = self.source.original_of(source_node)?;
        let pulse = self.source.pulse_of(source_node)?;
        let label = self
            .source
            .graph()
            .vertex(source_node)?
            .ok_or_else(|| Error::NotFound(format!("spread graph node {source_node}")))?
            .label;
        let keys = self.target.keys();
        let node = self.target.graph().add_vertex(
            &label,
            props([
                (keys.original.as_str(), Value::Vertex(original)),
                (keys.pulse.as_str(), Value::from(pulse)),
            ]),
        )?;
        self.nodes.insert(original, pulse, node);
        Ok(node)
    }

    /// Copy `source_edge` into the output between two output nodes.
    pub(crate) fn add_edge(
        &mut self,
        source_edge: &Edge,
        from: VertexId,
        to: VertexId,
    ) -> Result<EdgeId> {
        let original = self.source.original_edge_of(source_edge.id)?;
        self.target.graph().add_edge(
            from,
            to,
            &source_edge.label,
            props([(self.target.keys().original.as_str(), Value::Edge(original))]),
        )
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn finish(self) -> SpreadGraph {
        self.target
    }
}
