//! # Policies
//!
//! Every pulse is parameterized by seven pluggable decisions:
//!
//! | Trait | Question it answers | Default |
//! |-------|---------------------|---------|
//! | `PulseInception` | Which vertices emit this pulse? | `MinimumActivation` (threshold 0) |
//! | `ActivationMode` | How is received activation squashed? | `ActivationFunction::Identity` |
//! | `AttenuationMode` | How much of a vertex's own activation is forwarded? | `Attenuation::None` |
//! | `BranchMode` | What is the fan-out discount? | `Branch::None` |
//! | `SendMode` | Which incident edges may carry activation? | `SpreadingMode::basic()` |
//! | `EdgeWeight` | How much does an edge scale what it carries? | `ConstantWeight(1.0)` |
//! | `AbortCondition` | Should the run stop after this pulse? | none registered |
//!
//! Built-in variants are closed enums. `ByPulse` and `ByType` wrap any of
//! them to pick a policy by pulse threshold or by an element's type property.
//!
//! All policies receive a `Context` naming the graph, the marker keys and the
//! current pulse, and return `Result` so graph failures propagate into the
//! unit that asked.

pub mod abort;
pub mod activation;
pub mod attenuation;
pub mod branch;
pub mod edge_weight;
pub mod inception;
pub mod keyed;
pub mod send;

use std::fmt;
use std::sync::Arc;

use crate::execution::ExecutionResult;
use crate::keys::PropertyKeys;
use crate::model::{Direction, Edge, VertexId};
use crate::storage::GraphStore;
use crate::{Error, Result};

pub use abort::{ActivationBelow, FnAbortCondition, MaxActivatedVertices};
pub use activation::ActivationFunction;
pub use attenuation::Attenuation;
pub use branch::Branch;
pub use edge_weight::ConstantWeight;
pub use inception::{MinimumActivation, TypedMinimumActivation};
pub use keyed::{ByPulse, ByType, TypeKey};
pub use send::{SendRule, SpreadingMode};

// ============================================================================
// Policy traits
// ============================================================================

/// Selects the vertices that emit at the current pulse.
pub trait PulseInception: Send + Sync {
    fn starting_vertices(&self, ctx: &Context<'_>) -> Result<Vec<VertexId>>;
}

/// Squashing function applied to `input + previous activation`.
pub trait ActivationMode: Send + Sync {
    fn activation(&self, ctx: &Context<'_>, vertex: VertexId, x: f64) -> Result<f64>;
}

/// Multiplier on a vertex's previous activation before it is forwarded.
pub trait AttenuationMode: Send + Sync {
    fn attenuation(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64>;
}

/// Fan-out discount applied to output activation.
pub trait BranchMode: Send + Sync {
    fn branch(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64>;
}

/// Edge eligibility: may `vertex` send along `edge` at the current pulse?
pub trait SendMode: Send + Sync {
    fn allows(&self, ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> Result<bool>;
}

/// Scale applied to output activation on one edge. `with_direction` is true
/// when activation flows tail → head.
pub trait EdgeWeight: Send + Sync {
    fn weight(&self, ctx: &Context<'_>, edge: &Edge, with_direction: bool) -> Result<f64>;
}

/// Early termination, checked once after each completed pulse.
pub trait AbortCondition: Send + Sync {
    fn should_abort(&self, ctx: &Context<'_>, result: &ExecutionResult) -> Result<bool>;
}

macro_rules! forward_arc {
    ($($tr:ident => fn $name:ident(&self, $($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {$(
        impl<T: $tr + ?Sized> $tr for Arc<T> {
            fn $name(&self, $($arg: $ty),*) -> $ret {
                (**self).$name($($arg),*)
            }
        }
    )*};
}

forward_arc! {
    PulseInception => fn starting_vertices(&self, ctx: &Context<'_>) -> Result<Vec<VertexId>>;
    ActivationMode => fn activation(&self, ctx: &Context<'_>, vertex: VertexId, x: f64) -> Result<f64>;
    AttenuationMode => fn attenuation(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64>;
    BranchMode => fn branch(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64>;
    SendMode => fn allows(&self, ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> Result<bool>;
    EdgeWeight => fn weight(&self, ctx: &Context<'_>, edge: &Edge, with_direction: bool) -> Result<f64>;
    AbortCondition => fn should_abort(&self, ctx: &Context<'_>, result: &ExecutionResult) -> Result<bool>;
}

// ============================================================================
// Context
// ============================================================================

/// What a policy may look at while deciding.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    graph: &'a dyn GraphStore,
    keys: &'a PropertyKeys,
    policies: &'a PolicySet,
    pulse: u32,
}

impl<'a> Context<'a> {
    pub fn new(
        graph: &'a dyn GraphStore,
        keys: &'a PropertyKeys,
        policies: &'a PolicySet,
        pulse: u32,
    ) -> Self {
        Self { graph, keys, policies, pulse }
    }

    pub fn graph(&self) -> &'a dyn GraphStore {
        self.graph
    }

    pub fn keys(&self) -> &'a PropertyKeys {
        self.keys
    }

    pub fn policies(&self) -> &'a PolicySet {
        self.policies
    }

    /// The pulse being computed, starting at 1.
    pub fn pulse(&self) -> u32 {
        self.pulse
    }

    /// Configured pulse limit.
    pub fn pulses(&self) -> u32 {
        self.policies.pulses()
    }

    /// Stored vertex activation at `pulse`, or 0 when absent.
    pub fn activation(&self, vertex: VertexId, pulse: u32) -> Result<f64> {
        Ok(self
            .graph
            .vertex_property(vertex, &self.keys.vertex_activation(pulse))?
            .and_then(|v| v.as_float())
            .unwrap_or(0.0))
    }

    /// Incident edges the configured send mode lets `vertex` use now.
    pub fn allowed_edges(&self, vertex: VertexId) -> Result<Vec<Edge>> {
        let send_mode = self.policies.send_mode();
        let mut allowed = Vec::new();
        for edge in self.graph.incident_edges(vertex, Direction::Both)? {
            if send_mode.allows(self, vertex, &edge)? {
                allowed.push(edge);
            }
        }
        Ok(allowed)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("prefix", &self.keys.prefix())
            .field("pulse", &self.pulse)
            .finish()
    }
}

// ============================================================================
// PolicySet
// ============================================================================

/// The full set of policies for one run. Cheap to clone.
#[derive(Clone)]
pub struct PolicySet {
    pulses: u32,
    pulse_inception: Arc<dyn PulseInception>,
    activation_mode: Arc<dyn ActivationMode>,
    attenuation_mode: Arc<dyn AttenuationMode>,
    branch_mode: Arc<dyn BranchMode>,
    send_mode: Arc<dyn SendMode>,
    edge_weight: Arc<dyn EdgeWeight>,
    abort_conditions: Vec<Arc<dyn AbortCondition>>,
}

impl PolicySet {
    /// Start a builder with every policy at its default.
    pub fn builder(pulses: u32) -> PolicySetBuilder {
        PolicySetBuilder::new(pulses)
    }

    /// Builder pre-filled with this set's policies.
    pub fn to_builder(&self) -> PolicySetBuilder {
        PolicySetBuilder { set: self.clone() }
    }

    pub fn pulses(&self) -> u32 {
        self.pulses
    }

    pub fn pulse_inception(&self) -> &dyn PulseInception {
        self.pulse_inception.as_ref()
    }

    pub fn activation_mode(&self) -> &dyn ActivationMode {
        self.activation_mode.as_ref()
    }

    pub fn attenuation_mode(&self) -> &dyn AttenuationMode {
        self.attenuation_mode.as_ref()
    }

    pub fn branch_mode(&self) -> &dyn BranchMode {
        self.branch_mode.as_ref()
    }

    pub fn send_mode(&self) -> &dyn SendMode {
        self.send_mode.as_ref()
    }

    pub fn edge_weight(&self) -> &dyn EdgeWeight {
        self.edge_weight.as_ref()
    }

    pub fn abort_conditions(&self) -> impl Iterator<Item = &dyn AbortCondition> {
        self.abort_conditions.iter().map(|c| c.as_ref())
    }
}

impl fmt::Debug for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicySet")
            .field("pulses", &self.pulses)
            .field("abort_conditions", &self.abort_conditions.len())
            .finish_non_exhaustive()
    }
}

/// Builder for `PolicySet`.
pub struct PolicySetBuilder {
    set: PolicySet,
}

impl PolicySetBuilder {
    fn new(pulses: u32) -> Self {
        Self {
            set: PolicySet {
                pulses,
                pulse_inception: Arc::new(MinimumActivation::default()),
                activation_mode: Arc::new(ActivationFunction::Identity),
                attenuation_mode: Arc::new(Attenuation::None),
                branch_mode: Arc::new(Branch::None),
                send_mode: Arc::new(SpreadingMode::basic()),
                edge_weight: Arc::new(ConstantWeight::default()),
                abort_conditions: Vec::new(),
            },
        }
    }

    pub fn pulses(mut self, pulses: u32) -> Self {
        self.set.pulses = pulses;
        self
    }

    pub fn pulse_inception(mut self, policy: impl PulseInception + 'static) -> Self {
        self.set.pulse_inception = Arc::new(policy);
        self
    }

    pub fn activation_mode(mut self, policy: impl ActivationMode + 'static) -> Self {
        self.set.activation_mode = Arc::new(policy);
        self
    }

    pub fn attenuation_mode(mut self, policy: impl AttenuationMode + 'static) -> Self {
        self.set.attenuation_mode = Arc::new(policy);
        self
    }

    pub fn branch_mode(mut self, policy: impl BranchMode + 'static) -> Self {
        self.set.branch_mode = Arc::new(policy);
        self
    }

    pub fn send_mode(mut self, policy: impl SendMode + 'static) -> Self {
        self.set.send_mode = Arc::new(policy);
        self
    }

    pub fn edge_weight(mut self, policy: impl EdgeWeight + 'static) -> Self {
        self.set.edge_weight = Arc::new(policy);
        self
    }

    pub fn abort_condition(mut self, condition: impl AbortCondition + 'static) -> Self {
        self.set.abort_conditions.push(Arc::new(condition));
        self
    }

    pub fn clear_abort_conditions(mut self) -> Self {
        self.set.abort_conditions.clear();
        self
    }

    pub fn build(self) -> Result<PolicySet> {
        if self.set.pulses == 0 {
            return Err(Error::InvalidConfig("pulses must be >= 1".into()));
        }
        Ok(self.set)
    }
}

// ============================================================================
// Tests
// ============================================================================
