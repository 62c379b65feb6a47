//! Directed edge in the property graph.

use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value, VertexId};

/// Opaque edge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Which incident edges of a vertex to visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Edges whose tail is the vertex.
    Outgoing,
    /// Edges whose head is the vertex.
    Incoming,
    Both,
}

/// A directed edge `tail -> head`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub tail: VertexId,
    pub head: VertexId,
    pub label: String,
    pub properties: PropertyMap,
}

impl Edge {
    pub fn new(id: EdgeId, tail: VertexId, head: VertexId, label: impl Into<String>) -> Self {
        Self {
            id,
            tail,
            head,
            label: label.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// True when activation sent from `vertex` travels along the edge's
    /// natural tail → head direction.
    pub fn is_tail(&self, vertex: VertexId) -> bool {
        self.tail == vertex
    }

    /// The opposite endpoint from the given vertex.
    pub fn other_end(&self, from: VertexId) -> Option<VertexId> {
        if from == self.tail { Some(self.head) }
        else if from == self.head { Some(self.tail) }
        else { None }
    }

    /// Whether this edge touches `vertex` in the given direction.
    pub fn touches(&self, vertex: VertexId, dir: Direction) -> bool {
        match dir {
            Direction::Outgoing => self.tail == vertex,
            Direction::Incoming => self.head == vertex,
            Direction::Both => self.tail == vertex || self.head == vertex,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_end() {
        let e = Edge::new(EdgeId(1), VertexId(1), VertexId(2), "LINKS");
        assert_eq!(e.other_end(VertexId(1)), Some(VertexId(2)));
        assert_eq!(e.other_end(VertexId(2)), Some(VertexId(1)));
        assert_eq!(e.other_end(VertexId(3)), None);
    }

    #[test]
    fn test_self_loop_touches_both_ways() {
        let e = Edge::new(EdgeId(1), VertexId(7), VertexId(7), "SELF");
        assert!(e.touches(VertexId(7), Direction::Outgoing));
        assert!(e.touches(VertexId(7), Direction::Incoming));
        assert!(e.is_tail(VertexId(7)));
    }
}
