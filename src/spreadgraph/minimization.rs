//! Minimal causal sub-DAG for one original vertex.

use std::sync::Arc;

use tracing::{debug, info};

use super::transformation::Transformation;
use super::{SpreadGraph, SpreadGraphKeys};
use crate::lifecycle::{Cancellation, Lifecycle, LifecycleState};
use crate::model::VertexId;
use crate::storage::GraphStore;
use crate::Result;

/// Keeps the nodes for `original` (up to `end_pulse`) and every ancestor
/// reachable backwards from them, down to `start_pulse`.
///
/// Each ancestor is copied once; a second path reaching it only adds the
/// edge. Shared ancestors are therefore walked a single time.
pub struct RelevantMinimization {
    transformation: Transformation,
    original: VertexId,
    lifecycle: Lifecycle,
}

impl RelevantMinimization {
    pub fn new(source: &SpreadGraph, original: VertexId) -> Self {
        Self {
            transformation: Transformation::new(source),
            original,
            lifecycle: Lifecycle::new("relevant minimization"),
        }
    }

    pub fn start_pulse(mut self, pulse: u32) -> Self {
        self.transformation = self.transformation.start_pulse(pulse);
        self
    }

    pub fn end_pulse(mut self, pulse: u32) -> Self {
        self.transformation = self.transformation.end_pulse(pulse);
        self
    }

    pub fn into<G: GraphStore>(mut self, graph: G) -> Self {
        self.transformation = self.transformation.into(graph);
        self
    }

    pub fn into_shared(mut self, graph: Arc<dyn GraphStore>) -> Self {
        self.transformation = self.transformation.into_shared(graph);
        self
    }

    pub fn keys(mut self, keys: SpreadGraphKeys) -> Self {
        self.transformation = self.transformation.keys(keys);
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

    pub fn cancellation(&self) -> Cancellation {
        self.lifecycle.cancellation().clone()
    }

    /// Build the minimized spread graph. Callable once.
    pub fn run(&self) -> Result<SpreadGraph> {
        self.lifecycle.start()?;
        let outcome = self.minimize();
        self.lifecycle.finish()?;
        outcome
    }

    fn minimize(&self) -> Result<SpreadGraph> {
        let source = self.transformation.source();
        let (start_pulse, end_pulse) = self.transformation.window();
        let mut writer = self.transformation.writer();

        // (source node, output node) pairs whose incoming edges are unvisited.
        let mut pending = Vec::new();
        for target in source.vertices_of(self.original)? {
            if self.is_interrupted() {
                break;
            }
            if source.pulse_of(target)? > end_pulse || writer.node(target)?.is_some() {
                continue;
            }
            let node = writer.add_node(target)?;
            pending.push((target, node));

            while let Some((source_node, node)) = pending.pop() {
                if self.is_interrupted() {
                    debug!(original = %self.original, "relevant minimization interrupted");
                    pending.clear();
                    break;
                }
                for edge in source.in_edges(source_node)? {
                    let sender = edge.tail;
                    if source.pulse_of(sender)? < start_pulse {
                        continue;
                    }
                    match writer.node(sender)? {
                        Some(existing) => {
                            writer.add_edge(&edge, existing, node)?;
                        }
                        None => {
                            let created = writer.add_node(sender)?;
                            writer.add_edge(&edge, created, node)?;
                            pending.push((sender, created));
                        }
                    }
                }
            }
        }

        info!(
            original = %self.original,
            nodes = writer.node_count(),
            "spread graph minimized"
        );
        Ok(writer.finish())
    }
}
