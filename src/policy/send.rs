//! Edge eligibility rules.
//!
//! All rules allow every edge at pulse 1. From pulse 2 on they look at the
//! markers left by the previous pulse:
//!
//! - `RecentReceiver`: the vertex only sends if it received input last pulse.
//! - `Forward`: an edge that delivered activation *to* the vertex last pulse
//!   is not used to send it straight back.
//! - `ForwardLoop`: like `Forward`, but such an edge is re-permitted when
//!   another edge also delivered to the vertex in the same direction, so
//!   loops longer than one hop still propagate.
//!
//! `SpreadingMode` combines rules with logical AND.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::{Context, SendMode};
use crate::model::{Direction, Edge, VertexId};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SendRule {
    Basic,
    RecentReceiver,
    Forward,
    ForwardLoop,
}

impl SendRule {
    fn check(self, ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> Result<bool> {
        let pulse = ctx.pulse();
        if pulse <= 1 || self == SendRule::Basic {
            return Ok(true);
        }
        let keys = ctx.keys();
        let previous = pulse - 1;

        match self {
            SendRule::Basic => Ok(true),
            SendRule::RecentReceiver => Ok(ctx
                .graph()
                .vertex_property(vertex, &keys.input_activation(previous))?
                .is_some()),
            SendRule::Forward => Ok(not_returning(ctx, vertex, edge)),
            SendRule::ForwardLoop => {
                if not_returning(ctx, vertex, edge) {
                    return Ok(true);
                }
                let toward = keys.edge_activation(previous, true);
                if edge.head == vertex
                    && edge.has(&toward)
                    && other_carrier(ctx, vertex, edge, Direction::Incoming, &toward)?
                {
                    return Ok(true);
                }
                let against = keys.edge_activation(previous, false);
                Ok(edge.tail == vertex
                    && edge.has(&against)
                    && other_carrier(ctx, vertex, edge, Direction::Outgoing, &against)?)
            }
        }
    }
}

/// True unless the edge delivered activation to `vertex` at the previous
/// pulse from the opposite end.
fn not_returning(ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> bool {
    let previous = ctx.pulse() - 1;
    let keys = ctx.keys();
    (edge.head == vertex && !edge.has(&keys.edge_activation(previous, true)))
        || (edge.tail == vertex && !edge.has(&keys.edge_activation(previous, false)))
}

/// Whether some other edge of `vertex` in `dir` carries `key`.
fn other_carrier(
    ctx: &Context<'_>,
    vertex: VertexId,
    edge: &Edge,
    dir: Direction,
    key: &str,
) -> Result<bool> {
    Ok(ctx
        .graph()
        .incident_edges(vertex, dir)?
        .iter()
        .any(|other| other.id != edge.id && other.has(key)))
}

/// Conjunction of send rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadingMode {
    rules: SmallVec<[SendRule; 2]>,
}

impl SpreadingMode {
    pub fn new(rules: impl IntoIterator<Item = SendRule>) -> Self {
        Self { rules: rules.into_iter().collect() }
    }

    pub fn basic() -> Self {
        Self { rules: smallvec![SendRule::Basic] }
    }

    pub fn recent_receiver() -> Self {
        Self { rules: smallvec![SendRule::RecentReceiver] }
    }

    pub fn forward() -> Self {
        Self { rules: smallvec![SendRule::Forward] }
    }

    pub fn forward_recent_receiver() -> Self {
        Self { rules: smallvec![SendRule::Forward, SendRule::RecentReceiver] }
    }

    pub fn forward_loop() -> Self {
        Self { rules: smallvec![SendRule::ForwardLoop] }
    }

    pub fn forward_loop_recent_receiver() -> Self {
        Self { rules: smallvec![SendRule::ForwardLoop, SendRule::RecentReceiver] }
    }

    pub fn rules(&self) -> &[SendRule] {
        &self.rules
    }
}

impl Default for SpreadingMode {
    fn default() -> Self {
        Self::basic()
    }
}

impl From<SendRule> for SpreadingMode {
    fn from(rule: SendRule) -> Self {
        Self { rules: smallvec![rule] }
    }
}

impl SendMode for SendRule {
    fn allows(&self, ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> Result<bool> {
        self.check(ctx, vertex, edge)
    }
}

impl SendMode for SpreadingMode {
    fn allows(&self, ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> Result<bool> {
        for rule in &self.rules {
            if !rule.check(ctx, vertex, edge)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyMap;
    use crate::policy::tests::Fixture;
    use crate::storage::GraphStore;
    use crate::Value;

    fn mark_edge(fx: &Fixture, tail: VertexId, head: VertexId, pulse: u32, with_direction: bool) {
        let edge = edge_between(fx, tail, head);
        fx.graph
            .set_edge_property(edge.id, &fx.keys.edge_activation(pulse, with_direction), Value::from(1.0))
            .unwrap();
    }

    fn edge_between(fx: &Fixture, tail: VertexId, head: VertexId) -> Edge {
        fx.graph
            .incident_edges(tail, Direction::Outgoing)
            .unwrap()
            .into_iter()
            .find(|e| e.head == head)
            .unwrap()
    }

    #[test]
    fn test_everything_allowed_at_first_pulse() {
        let fx = Fixture::chain();
        mark_edge(&fx, fx.a, fx.b, 0, true);
        let ab = edge_between(&fx, fx.a, fx.b);
        for rule in [SendRule::Basic, SendRule::RecentReceiver, SendRule::Forward, SendRule::ForwardLoop] {
            assert!(SendMode::allows(&rule, &fx.ctx(1), fx.b, &ab).unwrap());
        }
    }

    #[test]
    fn test_recent_receiver() {
        let fx = Fixture::chain();
        fx.graph
            .set_vertex_property(fx.b, &fx.keys.input_activation(1), Value::from(2.0))
            .unwrap();
        let ab = edge_between(&fx, fx.a, fx.b);
        let mode = SpreadingMode::recent_receiver();
        assert!(mode.allows(&fx.ctx(2), fx.b, &ab).unwrap());
        assert!(!mode.allows(&fx.ctx(2), fx.a, &ab).unwrap());
    }

    #[test]
    fn test_forward_blocks_the_way_back() {
        let fx = Fixture::chain();
        mark_edge(&fx, fx.a, fx.b, 1, true);
        let ab = edge_between(&fx, fx.a, fx.b);
        let bc = edge_between(&fx, fx.b, fx.c);
        let mode = SpreadingMode::forward();
        let ctx = fx.ctx(2);

        assert!(!mode.allows(&ctx, fx.b, &ab).unwrap());
        assert!(mode.allows(&ctx, fx.b, &bc).unwrap());
        assert!(mode.allows(&ctx, fx.a, &ab).unwrap());
    }

    #[test]
    fn test_forward_loop_reopens_with_a_second_carrier() {
        let fx = Fixture::chain();
        // A second edge into b that also delivered at pulse 1.
        let d = fx.graph.add_vertex("Node", PropertyMap::new()).unwrap();
        fx.graph.add_edge(d, fx.b, "NEXT", PropertyMap::new()).unwrap();
        mark_edge(&fx, fx.a, fx.b, 1, true);

        let ab = edge_between(&fx, fx.a, fx.b);
        let ctx = fx.ctx(2);
        assert!(!SpreadingMode::forward_loop().allows(&ctx, fx.b, &ab).unwrap());

        mark_edge(&fx, d, fx.b, 1, true);
        let ab = edge_between(&fx, fx.a, fx.b);
        assert!(SpreadingMode::forward_loop().allows(&ctx, fx.b, &ab).unwrap());
        assert!(!SpreadingMode::forward().allows(&ctx, fx.b, &ab).unwrap());
    }

    #[test]
    fn test_composite_is_conjunction() {
        let fx = Fixture::chain();
        let bc = edge_between(&fx, fx.b, fx.c);
        let ctx = fx.ctx(2);
        // Forward allows b -> c, but b received nothing at pulse 1.
        assert!(SpreadingMode::forward().allows(&ctx, fx.b, &bc).unwrap());
        assert!(!SpreadingMode::forward_recent_receiver().allows(&ctx, fx.b, &bc).unwrap());
        assert_eq!(SpreadingMode::forward_loop_recent_receiver().rules().len(), 2);
    }
}
