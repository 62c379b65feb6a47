//! Built-in pulse inception.

use hashbrown::HashMap;

use super::keyed::{ByPulse, TypeKey};
use super::{Context, PulseInception};
use crate::model::VertexId;
use crate::storage::PropertyPredicate;
use crate::Result;

/// Vertices whose activation at the previous pulse reaches a threshold.
///
/// The threshold may change with the pulse; it defaults to 0, which starts
/// every vertex holding any activation.
#[derive(Debug, Clone)]
pub struct MinimumActivation {
    thresholds: ByPulse<f64>,
}

impl MinimumActivation {
    pub fn new(threshold: f64) -> Self {
        Self { thresholds: ByPulse::new(threshold) }
    }

    /// Use `threshold` from `pulse` on.
    pub fn from_pulse(mut self, pulse: u32, threshold: f64) -> Self {
        self.thresholds.insert(pulse, threshold);
        self
    }

    pub fn threshold(&self, pulse: u32) -> f64 {
        *self.thresholds.select(pulse)
    }
}

impl Default for MinimumActivation {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl PulseInception for MinimumActivation {
    fn starting_vertices(&self, ctx: &Context<'_>) -> Result<Vec<VertexId>> {
        let pulse = ctx.pulse();
        let key = ctx.keys().vertex_activation(pulse.saturating_sub(1));
        ctx.graph()
            .vertices_where(&PropertyPredicate::gte(key, self.threshold(pulse)))
    }
}

/// Per-type thresholds. Vertices whose type has no threshold never start.
#[derive(Debug, Clone)]
pub struct TypedMinimumActivation {
    type_key: String,
    thresholds: HashMap<TypeKey, f64>,
}

impl TypedMinimumActivation {
    pub fn new(type_key: impl Into<String>) -> Self {
        Self { type_key: type_key.into(), thresholds: HashMap::new() }
    }

    pub fn with(mut self, type_key: impl Into<TypeKey>, threshold: f64) -> Self {
        self.thresholds.insert(type_key.into(), threshold);
        self
    }
}

impl PulseInception for TypedMinimumActivation {
    fn starting_vertices(&self, ctx: &Context<'_>) -> Result<Vec<VertexId>> {
        let key = ctx.keys().vertex_activation(ctx.pulse().saturating_sub(1));
        let graph = ctx.graph();
        let mut starting = Vec::new();
        for vertex in graph.vertices_where(&PropertyPredicate::exists(key.as_str()))? {
            let Some(type_value) = graph.vertex_property(vertex, &self.type_key)? else {
                continue;
            };
            let Some(threshold) = TypeKey::of(&type_value).and_then(|k| self.thresholds.get(&k))
            else {
                continue;
            };
            let activation = graph
                .vertex_property(vertex, &key)?
                .and_then(|v| v.as_float())
                .unwrap_or(0.0);
            if activation >= *threshold {
                starting.push(vertex);
            }
        }
        Ok(starting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyMap;
    use crate::policy::tests::Fixture;
    use crate::storage::GraphStore;
    use crate::Value;

    #[test]
    fn test_default_starts_every_activated_vertex() {
        let fx = Fixture::chain();
        fx.set_activation(fx.a, 0, 0.1);
        fx.set_activation(fx.c, 0, 5.0);
        let started = MinimumActivation::default().starting_vertices(&fx.ctx(1)).unwrap();
        assert_eq!(started, vec![fx.a, fx.c]);
    }

    #[test]
    fn test_threshold_per_pulse() {
        let fx = Fixture::chain();
        fx.set_activation(fx.a, 1, 1.0);
        fx.set_activation(fx.b, 1, 3.0);
        fx.set_activation(fx.a, 2, 1.0);
        fx.set_activation(fx.b, 2, 3.0);
        let inception = MinimumActivation::new(0.0).from_pulse(3, 2.0);

        assert_eq!(inception.starting_vertices(&fx.ctx(2)).unwrap(), vec![fx.a, fx.b]);
        assert_eq!(inception.starting_vertices(&fx.ctx(3)).unwrap(), vec![fx.b]);
    }

    #[test]
    fn test_typed_skips_unregistered_types() {
        let fx = Fixture::chain();
        let untyped = fx.graph.add_vertex("Node", PropertyMap::new()).unwrap();
        fx.graph.set_vertex_property(fx.a, "kind", Value::from("doc")).unwrap();
        fx.graph.set_vertex_property(fx.b, "kind", Value::from("doc")).unwrap();
        fx.graph.set_vertex_property(fx.c, "kind", Value::from("tag")).unwrap();
        for v in [fx.a, fx.b, fx.c, untyped] {
            fx.set_activation(v, 0, 2.0);
        }
        fx.set_activation(fx.b, 1, 0.5);

        let inception = TypedMinimumActivation::new("kind").with("doc", 1.0);
        assert_eq!(inception.starting_vertices(&fx.ctx(1)).unwrap(), vec![fx.a, fx.b]);
        assert_eq!(inception.starting_vertices(&fx.ctx(2)).unwrap(), Vec::<VertexId>::new());
    }
}
