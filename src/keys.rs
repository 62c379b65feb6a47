//! Marker property naming.
//!
//! Every run writes four families of per-pulse markers. Keys are namespaced
//! by a run prefix so several runs can share one graph:
//!
//! ```text
//! <prefix>_output_activation_<pulse>
//! <prefix>_edge_activation_<with_direction>_<pulse>
//! <prefix>_input_activation_<pulse>
//! <prefix>_vertex_activation_<pulse>
//! ```

const OUTPUT_ACTIVATION: &str = "output_activation";
const EDGE_ACTIVATION: &str = "edge_activation";
const INPUT_ACTIVATION: &str = "input_activation";
const VERTEX_ACTIVATION: &str = "vertex_activation";

/// Whether an activation value may be persisted.
///
/// Only finite values strictly above zero are stored; everything else is
/// treated as absent.
#[inline]
pub fn is_valid_activation(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Key factory for one run's markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKeys {
    prefix: String,
}

impl PropertyKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Keys under a fresh random prefix.
    pub fn random() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Activation a vertex forwards at `pulse`.
    pub fn output_activation(&self, pulse: u32) -> String {
        format!("{}_{OUTPUT_ACTIVATION}_{pulse}", self.prefix)
    }

    /// Activation an edge carries at `pulse`. `with_direction` is true when
    /// it flows tail → head.
    pub fn edge_activation(&self, pulse: u32, with_direction: bool) -> String {
        format!("{}_{EDGE_ACTIVATION}_{with_direction}_{pulse}", self.prefix)
    }

    /// Sum a vertex received at `pulse`.
    pub fn input_activation(&self, pulse: u32) -> String {
        format!("{}_{INPUT_ACTIVATION}_{pulse}", self.prefix)
    }

    /// Vertex level after `pulse`; pulse 0 holds the seed.
    pub fn vertex_activation(&self, pulse: u32) -> String {
        format!("{}_{VERTEX_ACTIVATION}_{pulse}", self.prefix)
    }

    /// Every vertex marker key for pulses `0..=pulses`.
    pub fn vertex_keys(&self, pulses: u32) -> Vec<String> {
        (0..=pulses)
            .flat_map(|p| {
                [
                    self.output_activation(p),
                    self.input_activation(p),
                    self.vertex_activation(p),
                ]
            })
            .collect()
    }

    /// Every edge marker key for pulses `0..=pulses`.
    pub fn edge_keys(&self, pulses: u32) -> Vec<String> {
        (0..=pulses)
            .flat_map(|p| [self.edge_activation(p, true), self.edge_activation(p, false)])
            .collect()
    }
}
