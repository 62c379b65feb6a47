//! In-memory graph store.
//!
//! This is the reference implementation of `GraphStore`.
//! It uses hashbrown maps protected by parking_lot RwLocks.
//!
//! ## Concurrency
//!
//! - Each collection has its own lock. Property writes take the write lock
//!   of exactly one collection, so concurrent units writing different
//!   elements serialize only briefly.
//! - `create_*_property` checks presence and inserts under one write lock,
//!   which is what makes the write-once marker check race free.
//! - Queries copy out IDs and drop their locks before returning; results are
//!   snapshots, not live views.
//!
//! Use this backend for:
//! - Testing the engine, policies and spread graph builders
//! - Embedding spreading activation over graphs that fit in memory
//! - Holding derived spread graphs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::model::*;
use crate::{Error, Result};
use super::{GraphStore, PropertyPredicate};

type Adjacency = SmallVec<[EdgeId; 8]>;

// ============================================================================
// MemoryGraph
// ============================================================================

/// In-memory property graph. Cloning shares the same underlying graph.
#[derive(Clone)]
pub struct MemoryGraph {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    vertices: RwLock<HashMap<VertexId, Vertex>>,
    edges: RwLock<HashMap<EdgeId, Edge>>,
    /// vertex_id → incident edge IDs (a self-loop is listed once)
    adjacency: RwLock<HashMap<VertexId, Adjacency>>,
    next_vertex_id: AtomicU64,
    next_edge_id: AtomicU64,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                vertices: RwLock::new(HashMap::new()),
                edges: RwLock::new(HashMap::new()),
                adjacency: RwLock::new(HashMap::new()),
                next_vertex_id: AtomicU64::new(1),
                next_edge_id: AtomicU64::new(1),
            }),
        }
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGraph")
            .field("vertices", &self.inner.vertices.read().len())
            .field("edges", &self.inner.edges.read().len())
            .finish()
    }
}

fn already_set(key: &str, element: impl std::fmt::Display, current: &Value, new: &Value) -> Error {
    Error::PropertyAlreadySet {
        key: key.to_string(),
        element: element.to_string(),
        current: current.to_string(),
        new: new.to_string(),
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

impl GraphStore for MemoryGraph {
    // ========================================================================
    // Vertex / Edge CRUD
    // ========================================================================

    fn add_vertex(&self, label: &str, props: PropertyMap) -> Result<VertexId> {
        let id = VertexId(self.inner.next_vertex_id.fetch_add(1, Ordering::Relaxed));
        let vertex = Vertex {
            id,
            label: label.to_string(),
            properties: props,
        };
        self.inner.vertices.write().insert(id, vertex);
        self.inner.adjacency.write().insert(id, Adjacency::new());
        Ok(id)
    }

    fn add_edge(
        &self,
        tail: VertexId,
        head: VertexId,
        label: &str,
        props: PropertyMap,
    ) -> Result<EdgeId> {
        {
            let vertices = self.inner.vertices.read();
            if !vertices.contains_key(&tail) {
                return Err(Error::NotFound(format!("Tail vertex {tail}")));
            }
            if !vertices.contains_key(&head) {
                return Err(Error::NotFound(format!("Head vertex {head}")));
            }
        }

        let id = EdgeId(self.inner.next_edge_id.fetch_add(1, Ordering::Relaxed));
        let edge = Edge {
            id,
            tail,
            head,
            label: label.to_string(),
            properties: props,
        };
        self.inner.edges.write().insert(id, edge);

        let mut adj = self.inner.adjacency.write();
        adj.entry(tail).or_default().push(id);
        if tail != head {
            adj.entry(head).or_default().push(id);
        }

        Ok(id)
    }

    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>> {
        Ok(self.inner.vertices.read().get(&id).cloned())
    }

    fn edge(&self, id: EdgeId) -> Result<Option<Edge>> {
        Ok(self.inner.edges.read().get(&id).cloned())
    }

    fn vertex_ids(&self) -> Result<Vec<VertexId>> {
        let mut ids: Vec<VertexId> = self.inner.vertices.read().keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn edge_ids(&self) -> Result<Vec<EdgeId>> {
        let mut ids: Vec<EdgeId> = self.inner.edges.read().keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn vertex_count(&self) -> Result<u64> {
        Ok(self.inner.vertices.read().len() as u64)
    }

    fn edge_count(&self) -> Result<u64> {
        Ok(self.inner.edges.read().len() as u64)
    }

    // ========================================================================
    // Properties
    // ========================================================================

    fn vertex_property(&self, id: VertexId, key: &str) -> Result<Option<Value>> {
        let vertices = self.inner.vertices.read();
        let vertex = vertices.get(&id).ok_or_else(|| Error::NotFound(format!("Vertex {id}")))?;
        Ok(vertex.properties.get(key).cloned())
    }

    fn edge_property(&self, id: EdgeId, key: &str) -> Result<Option<Value>> {
        let edges = self.inner.edges.read();
        let edge = edges.get(&id).ok_or_else(|| Error::NotFound(format!("Edge {id}")))?;
        Ok(edge.properties.get(key).cloned())
    }

    fn set_vertex_property(&self, id: VertexId, key: &str, val: Value) -> Result<()> {
        let mut vertices = self.inner.vertices.write();
        let vertex = vertices.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Vertex {id}")))?;
        vertex.properties.insert(key.to_string(), val);
        Ok(())
    }

    fn set_edge_property(&self, id: EdgeId, key: &str, val: Value) -> Result<()> {
        let mut edges = self.inner.edges.write();
        let edge = edges.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Edge {id}")))?;
        edge.properties.insert(key.to_string(), val);
        Ok(())
    }

    fn create_vertex_property(&self, id: VertexId, key: &str, val: Value) -> Result<()> {
        let mut vertices = self.inner.vertices.write();
        let vertex = vertices.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Vertex {id}")))?;
        if let Some(current) = vertex.properties.get(key) {
            return Err(already_set(key, id, current, &val));
        }
        vertex.properties.insert(key.to_string(), val);
        Ok(())
    }

    fn create_edge_property(&self, id: EdgeId, key: &str, val: Value) -> Result<()> {
        let mut edges = self.inner.edges.write();
        let edge = edges.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Edge {id}")))?;
        if let Some(current) = edge.properties.get(key) {
            return Err(already_set(key, id, current, &val));
        }
        edge.properties.insert(key.to_string(), val);
        Ok(())
    }

    fn remove_vertex_property(&self, id: VertexId, key: &str) -> Result<bool> {
        let mut vertices = self.inner.vertices.write();
        let vertex = vertices.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Vertex {id}")))?;
        Ok(vertex.properties.remove(key).is_some())
    }

    fn remove_edge_property(&self, id: EdgeId, key: &str) -> Result<bool> {
        let mut edges = self.inner.edges.write();
        let edge = edges.get_mut(&id).ok_or_else(|| Error::NotFound(format!("Edge {id}")))?;
        Ok(edge.properties.remove(key).is_some())
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn incident_edges(&self, vertex: VertexId, dir: Direction) -> Result<Vec<Edge>> {
        let edge_ids = self
            .inner
            .adjacency
            .read()
            .get(&vertex)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Vertex {vertex}")))?;

        let edges = self.inner.edges.read();
        Ok(edge_ids
            .iter()
            .filter_map(|id| edges.get(id))
            .filter(|e| e.touches(vertex, dir))
            .cloned()
            .collect())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn vertices_where(&self, predicate: &PropertyPredicate) -> Result<Vec<VertexId>> {
        let mut ids: Vec<VertexId> = self
            .inner
            .vertices
            .read()
            .values()
            .filter(|v| predicate.matches(&v.properties))
            .map(|v| v.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn edges_where(&self, predicate: &PropertyPredicate) -> Result<Vec<Edge>> {
        let mut edges: Vec<Edge> = self
            .inner
            .edges
            .read()
            .values()
            .filter(|e| predicate.matches(&e.properties))
            .cloned()
            .collect();
        edges.sort_by_key(|e| e.id);
        Ok(edges)
    }

    fn sum_edge_property(&self, vertex: VertexId, dir: Direction, key: &str) -> Result<f64> {
        let edge_ids = self
            .inner
            .adjacency
            .read()
            .get(&vertex)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Vertex {vertex}")))?;

        let edges = self.inner.edges.read();
        Ok(edge_ids
            .iter()
            .filter_map(|id| edges.get(id))
            .filter(|e| e.touches(vertex, dir))
            .filter_map(|e| e.properties.get(key).and_then(Value::as_float))
            .sum())
    }

    fn remove_vertex_properties(&self, keys: &[String]) -> Result<usize> {
        let mut vertices = self.inner.vertices.write();
        let mut removed = 0;
        for vertex in vertices.values_mut() {
            for key in keys {
                if vertex.properties.remove(key).is_some() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn remove_edge_properties(&self, keys: &[String]) -> Result<usize> {
        let mut edges = self.inner.edges.write();
        let mut removed = 0;
        for edge in edges.values_mut() {
            for key in keys {
                if edge.properties.remove(key).is_some() {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

// ============================================================================
// Tests
// ============================================================================
