//! Keyed policy dispatch.
//!
//! `ByPulse<P>` picks the policy registered at the greatest pulse threshold
//! not above the current pulse. `ByType<P>` reads a type property from the
//! vertex (or, for edge weights, the edge) and picks the policy registered
//! for that value. Both fall back to a default.
//!
//! ```
//! use spreading_activation::policy::{ActivationFunction, ByPulse};
//!
//! // Identity for pulses 1-2, sigmoid from pulse 3 on.
//! let mode = ByPulse::new(ActivationFunction::Identity)
//!     .with(3, ActivationFunction::Sigmoid);
//! assert_eq!(*mode.select(2), ActivationFunction::Identity);
//! assert_eq!(*mode.select(7), ActivationFunction::Sigmoid);
//! ```

use std::collections::BTreeMap;

use hashbrown::HashMap;

use super::{
    AbortCondition, ActivationMode, AttenuationMode, BranchMode, Context, EdgeWeight,
    PulseInception, SendMode,
};
use crate::execution::ExecutionResult;
use crate::model::{Edge, EdgeId, Value, VertexId};
use crate::Result;

// ============================================================================
// ByPulse
// ============================================================================

#[derive(Debug, Clone)]
pub struct ByPulse<P> {
    from_pulse: BTreeMap<u32, P>,
    default: P,
}

impl<P> ByPulse<P> {
    pub fn new(default: P) -> Self {
        Self { from_pulse: BTreeMap::new(), default }
    }

    /// Use `policy` from `pulse` on, until a later threshold takes over.
    pub fn with(mut self, pulse: u32, policy: P) -> Self {
        self.insert(pulse, policy);
        self
    }

    pub fn insert(&mut self, pulse: u32, policy: P) {
        self.from_pulse.insert(pulse, policy);
    }

    pub fn select(&self, pulse: u32) -> &P {
        self.from_pulse
            .range(..=pulse)
            .next_back()
            .map(|(_, policy)| policy)
            .unwrap_or(&self.default)
    }
}

impl<P: Default> Default for ByPulse<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: PulseInception> PulseInception for ByPulse<P> {
    fn starting_vertices(&self, ctx: &Context<'_>) -> Result<Vec<VertexId>> {
        self.select(ctx.pulse()).starting_vertices(ctx)
    }
}

impl<P: ActivationMode> ActivationMode for ByPulse<P> {
    fn activation(&self, ctx: &Context<'_>, vertex: VertexId, x: f64) -> Result<f64> {
        self.select(ctx.pulse()).activation(ctx, vertex, x)
    }
}

impl<P: AttenuationMode> AttenuationMode for ByPulse<P> {
    fn attenuation(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64> {
        self.select(ctx.pulse()).attenuation(ctx, vertex)
    }
}

impl<P: BranchMode> BranchMode for ByPulse<P> {
    fn branch(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64> {
        self.select(ctx.pulse()).branch(ctx, vertex)
    }
}

impl<P: SendMode> SendMode for ByPulse<P> {
    fn allows(&self, ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> Result<bool> {
        self.select(ctx.pulse()).allows(ctx, vertex, edge)
    }
}

impl<P: EdgeWeight> EdgeWeight for ByPulse<P> {
    fn weight(&self, ctx: &Context<'_>, edge: &Edge, with_direction: bool) -> Result<f64> {
        self.select(ctx.pulse()).weight(ctx, edge, with_direction)
    }
}

impl<P: AbortCondition> AbortCondition for ByPulse<P> {
    fn should_abort(&self, ctx: &Context<'_>, result: &ExecutionResult) -> Result<bool> {
        self.select(ctx.pulse()).should_abort(ctx, result)
    }
}

// ============================================================================
// ByType
// ============================================================================

/// Hashable view of a type property value. Floats and nulls have none.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Bool(bool),
    Int(i64),
    String(String),
    Vertex(VertexId),
    Edge(EdgeId),
}

impl TypeKey {
    pub fn of(value: &Value) -> Option<TypeKey> {
        match value {
            Value::Bool(b) => Some(TypeKey::Bool(*b)),
            Value::Int(i) => Some(TypeKey::Int(*i)),
            Value::String(s) => Some(TypeKey::String(s.clone())),
            Value::Vertex(id) => Some(TypeKey::Vertex(*id)),
            Value::Edge(id) => Some(TypeKey::Edge(*id)),
            Value::Null | Value::Float(_) => None,
        }
    }
}

impl From<&str> for TypeKey {
    fn from(s: &str) -> Self {
        TypeKey::String(s.to_owned())
    }
}

impl From<String> for TypeKey {
    fn from(s: String) -> Self {
        TypeKey::String(s)
    }
}

impl From<i64> for TypeKey {
    fn from(i: i64) -> Self {
        TypeKey::Int(i)
    }
}

impl From<bool> for TypeKey {
    fn from(b: bool) -> Self {
        TypeKey::Bool(b)
    }
}

#[derive(Debug, Clone)]
pub struct ByType<P> {
    key: String,
    by_type: HashMap<TypeKey, P>,
    default: P,
}

impl<P> ByType<P> {
    /// Dispatch on the property `key`.
    pub fn new(key: impl Into<String>, default: P) -> Self {
        Self { key: key.into(), by_type: HashMap::new(), default }
    }

    pub fn with(mut self, type_key: impl Into<TypeKey>, policy: P) -> Self {
        self.insert(type_key, policy);
        self
    }

    pub fn insert(&mut self, type_key: impl Into<TypeKey>, policy: P) {
        self.by_type.insert(type_key.into(), policy);
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Policy for a type value; missing or unregistered types get the default.
    pub fn select(&self, type_value: Option<&Value>) -> &P {
        type_value
            .and_then(TypeKey::of)
            .and_then(|k| self.by_type.get(&k))
            .unwrap_or(&self.default)
    }

    fn for_vertex(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<&P> {
        let type_value = ctx.graph().vertex_property(vertex, &self.key)?;
        Ok(self.select(type_value.as_ref()))
    }
}

impl<P: ActivationMode> ActivationMode for ByType<P> {
    fn activation(&self, ctx: &Context<'_>, vertex: VertexId, x: f64) -> Result<f64> {
        self.for_vertex(ctx, vertex)?.activation(ctx, vertex, x)
    }
}

impl<P: AttenuationMode> AttenuationMode for ByType<P> {
    fn attenuation(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64> {
        self.for_vertex(ctx, vertex)?.attenuation(ctx, vertex)
    }
}

impl<P: BranchMode> BranchMode for ByType<P> {
    fn branch(&self, ctx: &Context<'_>, vertex: VertexId) -> Result<f64> {
        self.for_vertex(ctx, vertex)?.branch(ctx, vertex)
    }
}

impl<P: SendMode> SendMode for ByType<P> {
    fn allows(&self, ctx: &Context<'_>, vertex: VertexId, edge: &Edge) -> Result<bool> {
        self.for_vertex(ctx, vertex)?.allows(ctx, vertex, edge)
    }
}

/// Edge weights dispatch on the edge's own type property.
impl<P: EdgeWeight> EdgeWeight for ByType<P> {
    fn weight(&self, ctx: &Context<'_>, edge: &Edge, with_direction: bool) -> Result<f64> {
        self.select(edge.get(&self.key)).weight(ctx, edge, with_direction)
    }
}
