//! Spread graph generation from run markers.

use std::sync::Arc;

use tracing::{debug, info};

use super::{NodeIndex, SpreadGraph, SpreadGraphKeys};
use crate::execution::ExecutionResult;
use crate::lifecycle::{Cancellation, Lifecycle, LifecycleState};
use crate::model::{props, Direction, Edge, Value, VertexId};
use crate::storage::{GraphStore, MemoryGraph, PropertyPredicate};
use crate::{Error, Result};

/// One-shot builder of the spread graph of a run.
///
/// Start nodes are the vertices activated at `start_pulse`. For every later
/// pulse up to `end_pulse`, each vertex that received input gets a node, and
/// each edge that carried activation to it links the most recent node of
/// the sender.
pub struct Generation {
    result: ExecutionResult,
    start_pulse: u32,
    end_pulse: u32,
    into: Option<Arc<dyn GraphStore>>,
    keys: SpreadGraphKeys,
    lifecycle: Lifecycle,
}

impl Generation {
    pub fn new(result: ExecutionResult) -> Self {
        let end_pulse = result.pulse();
        Self {
            result,
            start_pulse: 0,
            end_pulse,
            into: None,
            keys: SpreadGraphKeys::default(),
            lifecycle: Lifecycle::new("generation"),
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

    /// Write the spread graph into `graph` instead of a fresh `MemoryGraph`.
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

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn interrupt(&self) {
        self.lifecycle.interrupt();
    }

    pub fn is_interrupted(&self) -> bool {
        self.lifecycle.is_interrupted()
    }

    /// Token for interrupting from another thread.
    pub fn cancellation(&self) -> Cancellation {
        self.lifecycle.cancellation().clone()
    }

    /// Build the spread graph. Callable once.
    pub fn run(&self) -> Result<SpreadGraph> {
        self.lifecycle.start()?;
        let outcome = self.generate();
        self.lifecycle.finish()?;
        outcome
    }

    fn generate(&self) -> Result<SpreadGraph> {
        let target = self
            .into
            .clone()
            .unwrap_or_else(|| Arc::new(MemoryGraph::new()));
        let spread = SpreadGraph::new(target, self.start_pulse, self.end_pulse, self.keys.clone());
        let mut writer = Writer {
            source: self.result.graph().as_ref(),
            spread: &spread,
            nodes: NodeIndex::default(),
        };
        let markers = self.result.keys();

        for (vertex, _) in self.result.activated_vertices(self.start_pulse)? {
            writer.node(vertex, self.start_pulse)?;
        }

        for pulse in self.start_pulse + 1..=self.end_pulse {
            if self.is_interrupted() {
                debug!(pulse, "spread graph generation interrupted");
                break;
            }
            let received = PropertyPredicate::gt(markers.input_activation(pulse), 0.0);
            let against = markers.edge_activation(pulse, false);
            let toward = markers.edge_activation(pulse, true);

            for vertex in writer.source.vertices_where(&received)? {
                let to = writer.node(vertex, pulse)?;
                for edge in writer.source.incident_edges(vertex, Direction::Outgoing)? {
                    if carried(&edge, &against) {
                        writer.link(&edge, edge.head, pulse, to)?;
                    }
                }
                for edge in writer.source.incident_edges(vertex, Direction::Incoming)? {
                    if carried(&edge, &toward) {
                        writer.link(&edge, edge.tail, pulse, to)?;
                    }
                }
            }
        }

        info!(
            start_pulse = self.start_pulse,
            end_pulse = self.end_pulse,
            nodes = writer.nodes.len(),
            "spread graph generated"
        );
        Ok(spread)
    }
}

fn carried(edge: &Edge, key: &str) -> bool {
    edge.get(key).and_then(Value::as_float).is_some_and(|v| v > 0.0)
}

struct Writer<'a> {
    source: &'a dyn GraphStore,
    spread: &'a SpreadGraph,
    nodes: NodeIndex,
}

impl Writer<'_> {
    /// Node for `original` at `pulse`, created on first use.
    fn node(&mut self, original: VertexId, pulse: u32) -> Result<VertexId> {
        if let Some(node) = self.nodes.get(original, pulse) {
            return Ok(node);
        }
        let vertex = self
            .source
            .vertex(original)?
            .ok_or_else(|| Error::NotFound(format!("vertex {original}")))?;
        let keys = self.spread.keys();
        let node = self.spread.graph().add_vertex(
            &format!("{}{pulse}", vertex.label),
            props([
                (keys.original.as_str(), Value::Vertex(original)),
                (keys.pulse.as_str(), Value::from(pulse)),
            ]),
        )?;
        self.nodes.insert(original, pulse, node);
        Ok(node)
    }

    /// Link the sender's most recent node before `pulse` to `to`.
    fn link(&mut self, edge: &Edge, sender: VertexId, pulse: u32, to: VertexId) -> Result<()> {
        let from = self.nodes.latest(sender, pulse - 1).ok_or_else(|| {
            Error::NotFound(format!("spread graph node for {sender} before pulse {pulse}"))
        })?;
        self.spread.graph().add_edge(
            from,
            to,
            &edge.label,
            props([(self.spread.keys().original.as_str(), Value::Edge(edge.id))]),
        )?;
        Ok(())
    }
}
