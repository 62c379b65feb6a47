//! # Graph Store Trait
//!
//! This is THE contract between the spreading activation engine and the
//! storage layer holding the graph. Every read, write and query the engine,
//! the result view and the spread graph builders perform goes through it.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryGraph` | `memory` | In-memory for testing/embedding |
//!
//! The trait is synchronous and object safe: the engine holds an
//! `Arc<dyn GraphStore>` and calls it from worker-pool threads, so every
//! implementation must tolerate concurrent readers and writers.

pub mod memory;
pub mod predicate;

use crate::model::*;
use crate::Result;

pub use memory::MemoryGraph;
pub use predicate::PropertyPredicate;

// ============================================================================
// GraphStore Trait
// ============================================================================

/// The universal graph contract.
///
/// Required methods cover element CRUD, property access and predicate
/// queries. Aggregations and bulk removals have default implementations on
/// top of them; backends with native support should override.
pub trait GraphStore: Send + Sync + 'static {
    // ========================================================================
    // Vertex / Edge CRUD
    // ========================================================================

    /// Create a vertex with the given label and properties.
    fn add_vertex(&self, label: &str, props: PropertyMap) -> Result<VertexId>;

    /// Create an edge `tail -> head`. Both endpoints must exist.
    fn add_edge(
        &self,
        tail: VertexId,
        head: VertexId,
        label: &str,
        props: PropertyMap,
    ) -> Result<EdgeId>;

    /// Get a vertex by ID. Returns None if not found.
    fn vertex(&self, id: VertexId) -> Result<Option<Vertex>>;

    /// Get an edge by ID. Returns None if not found.
    fn edge(&self, id: EdgeId) -> Result<Option<Edge>>;

    /// All vertex IDs, ascending.
    fn vertex_ids(&self) -> Result<Vec<VertexId>>;

    /// All edge IDs, ascending.
    fn edge_ids(&self) -> Result<Vec<EdgeId>>;

    /// Total number of vertices.
    fn vertex_count(&self) -> Result<u64>;

    /// Total number of edges.
    fn edge_count(&self) -> Result<u64>;

    // ========================================================================
    // Properties
    // ========================================================================

    /// Read one vertex property.
    fn vertex_property(&self, id: VertexId, key: &str) -> Result<Option<Value>>;

    /// Read one edge property.
    fn edge_property(&self, id: EdgeId, key: &str) -> Result<Option<Value>>;

    /// Set a vertex property (upsert).
    fn set_vertex_property(&self, id: VertexId, key: &str, val: Value) -> Result<()>;

    /// Set an edge property (upsert).
    fn set_edge_property(&self, id: EdgeId, key: &str, val: Value) -> Result<()>;

    /// Insert a vertex property that must not exist yet.
    ///
    /// Fails with `Error::PropertyAlreadySet` if the key is present. The
    /// presence check and the write are one atomic step.
    fn create_vertex_property(&self, id: VertexId, key: &str, val: Value) -> Result<()>;

    /// Insert an edge property that must not exist yet.
    fn create_edge_property(&self, id: EdgeId, key: &str, val: Value) -> Result<()>;

    /// Remove a vertex property. Returns true if it existed.
    fn remove_vertex_property(&self, id: VertexId, key: &str) -> Result<bool>;

    /// Remove an edge property. Returns true if it existed.
    fn remove_edge_property(&self, id: EdgeId, key: &str) -> Result<bool>;

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Incident edges of a vertex, filtered by direction.
    ///
    /// Each edge appears once, self-loops included.
    fn incident_edges(&self, vertex: VertexId, dir: Direction) -> Result<Vec<Edge>>;

    /// Distinct neighbours of a vertex in the given direction.
    fn adjacent_vertices(&self, vertex: VertexId, dir: Direction) -> Result<Vec<VertexId>> {
        let mut adjacent: Vec<VertexId> = self
            .incident_edges(vertex, dir)?
            .iter()
            .filter_map(|e| e.other_end(vertex))
            .collect();
        adjacent.sort();
        adjacent.dedup();
        Ok(adjacent)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Vertices whose properties satisfy the predicate, ascending by ID.
    fn vertices_where(&self, predicate: &PropertyPredicate) -> Result<Vec<VertexId>>;

    /// Edges whose properties satisfy the predicate, ascending by ID.
    fn edges_where(&self, predicate: &PropertyPredicate) -> Result<Vec<Edge>>;

    /// Vertices satisfying the predicate that carry a numeric `key`,
    /// ordered by that value descending (ties by ID ascending).
    fn vertices_ordered_by(
        &self,
        key: &str,
        predicate: &PropertyPredicate,
    ) -> Result<Vec<(VertexId, f64)>> {
        let mut ranked = Vec::new();
        for id in self.vertices_where(predicate)? {
            if let Some(value) = self.vertex_property(id, key)?.and_then(|v| v.as_float()) {
                ranked.push((id, value));
            }
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(ranked)
    }

    /// Sum of a numeric edge property over the incident edges of `vertex`.
    /// Edges without the property contribute nothing.
    fn sum_edge_property(&self, vertex: VertexId, dir: Direction, key: &str) -> Result<f64> {
        Ok(self
            .incident_edges(vertex, dir)?
            .iter()
            .filter_map(|e| e.get(key).and_then(Value::as_float))
            .sum())
    }

    // ========================================================================
    // Bulk removal
    // ========================================================================

    /// Drop the given keys from every vertex. Returns the number removed.
    fn remove_vertex_properties(&self, keys: &[String]) -> Result<usize> {
        let mut removed = 0;
        for id in self.vertex_ids()? {
            for key in keys {
                if self.remove_vertex_property(id, key)? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Drop the given keys from every edge. Returns the number removed.
    fn remove_edge_properties(&self, keys: &[String]) -> Result<usize> {
        let mut removed = 0;
        for id in self.edge_ids()? {
            for key in keys {
                if self.remove_edge_property(id, key)? {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}
