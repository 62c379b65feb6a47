//! Scalar property values.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EdgeId, VertexId};

/// A single-valued property.
///
/// Covers the scalar types the activation markers and spread graph need:
/// - Scalars: Bool, Int, Float, String
/// - Identifiers: Vertex, Edge (spread graph `original` references)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Vertex(VertexId),
    Edge(EdgeId),
}

// ============================================================================
// Accessors
// ============================================================================

impl Value {
    /// Attempt to extract as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempt to extract as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_vertex(&self) -> Option<VertexId> {
        match self {
            Value::Vertex(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            Value::Edge(id) => Some(*id),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<u32> for Value { fn from(v: u32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<VertexId> for Value { fn from(v: VertexId) -> Self { Value::Vertex(v) } }
impl From<EdgeId> for Value { fn from(v: EdgeId) -> Self { Value::Edge(v) } }

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Vertex(id) => write!(f, "{id}"),
            Value::Edge(id) => write!(f, "{id}"),
        }
    }
}

// ============================================================================
// Comparison
// ============================================================================

impl Value {
    /// Ordering between comparable values. Numbers compare across Int/Float;
    /// NULL and mismatched types yield None.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Vertex(a), Value::Vertex(b)) => a.partial_cmp(b),
            (Value::Edge(a), Value::Edge(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}
