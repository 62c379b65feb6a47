//! # spreading-activation: Pulse-Synchronous Spreading Activation
//!
//! Propagates a numeric activation signal across a directed property graph in
//! discrete pulses, for relevance ranking, influence analysis and provenance
//! discovery. Every pulse leaves write-once markers on the graph, from which a
//! spread graph (a provenance DAG of `(vertex, pulse)` nodes) can be rebuilt.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphStore` is the contract between engine and storage
//! 2. **Markers, not state**: all per-pulse activation lives on the graph as
//!    write-once properties; the engine itself only counts pulses
//! 3. **Pluggable policies**: six policy traits plus abort conditions, with
//!    pulse- and type-keyed dispatch as generic decorators
//! 4. **Barrier per phase**: emit and absorb run in parallel under a bounded
//!    task queue; a phase never overlaps the next one
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spreading_activation::{
//!     Execution, GraphStore, MemoryGraph, PolicySet, PropertyMap,
//! };
//!
//! # fn example() -> spreading_activation::Result<()> {
//! let graph = MemoryGraph::new();
//! let a = graph.add_vertex("Page", PropertyMap::new())?;
//! let b = graph.add_vertex("Page", PropertyMap::new())?;
//! graph.add_edge(a, b, "LINKS", PropertyMap::new())?;
//!
//! let policies = PolicySet::builder(3).build()?;
//! let execution = Execution::builder(graph.clone(), policies).build()?;
//! execution.activate_vertex(a, 1.0)?;
//!
//! let result = execution.run()?;
//! for (vertex, activation) in result.activated_vertices_now()? {
//!     println!("{vertex}: {activation}");
//! }
//! result.cleanup()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | `storage` | `GraphStore` contract + in-memory backend |
//! | `queue` | Bounded task queue with drain barrier |
//! | `policy` | Policy traits, built-in variants, keyed dispatch |
//! | `execution` | Pulse loop and the result view |
//! | `spreadgraph` | Provenance DAG generation and minimization |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod keys;
pub mod config;
pub mod lifecycle;
pub mod queue;
pub mod policy;
pub mod execution;
pub mod spreadgraph;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Vertex, Edge, Value, PropertyMap, props,
    VertexId, EdgeId, Direction,
};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{GraphStore, MemoryGraph, PropertyPredicate};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use keys::{PropertyKeys, is_valid_activation};
pub use config::ExecutionConfig;
pub use lifecycle::{Cancellation, LifecycleState};
pub use queue::{Task, TaskQueue, TaskSource};
pub use policy::{
    AbortCondition, ActivationMode, AttenuationMode, BranchMode, Context,
    EdgeWeight, PolicySet, PolicySetBuilder, PulseInception, SendMode,
};
pub use execution::{Execution, ExecutionBuilder, ExecutionResult, InterruptHandle};
pub use spreadgraph::{
    Generation, RelevantMinimization, SpreadGraph, SpreadGraphKeys,
};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lifecycle misuse: running twice, seeding after start.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A write-once property was written a second time.
    #[error("Property {key} already set for {element} (current value: {current}, new value: {new})")]
    PropertyAlreadySet {
        key: String,
        element: String,
        current: String,
        new: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Policy error: {0}")]
    PolicyError(String),

    /// A queued unit failed, or pulling it from its source failed.
    #[error("Task failed: {0}")]
    TaskFailed(#[source] Box<Error>),

    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    /// A failure inside one pulse, surfaced by `Execution::run`.
    #[error("Exception in pulse {pulse}: {source}")]
    Pulse {
        pulse: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Innermost error, unwrapping pulse and task wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Pulse { source, .. } | Error::TaskFailed(source) => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
