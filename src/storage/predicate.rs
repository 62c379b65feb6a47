//! Property predicates for vertex/edge queries.

use std::cmp::Ordering;

use crate::model::{PropertyMap, Value};

/// A filter over an element's properties.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyPredicate {
    /// Matches every element.
    Any,
    /// The key is present.
    Exists(String),
    /// The key is absent.
    Missing(String),
    /// The key holds a value equal to the given one.
    Eq(String, Value),
    /// The key holds a number strictly greater than the bound.
    Gt(String, f64),
    /// The key holds a number greater than or equal to the bound.
    Gte(String, f64),
    And(Vec<PropertyPredicate>),
    Or(Vec<PropertyPredicate>),
}

impl PropertyPredicate {
    pub fn exists(key: impl Into<String>) -> Self {
        PropertyPredicate::Exists(key.into())
    }

    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        PropertyPredicate::Eq(key.into(), value.into())
    }

    pub fn gt(key: impl Into<String>, bound: f64) -> Self {
        PropertyPredicate::Gt(key.into(), bound)
    }

    pub fn gte(key: impl Into<String>, bound: f64) -> Self {
        PropertyPredicate::Gte(key.into(), bound)
    }

    /// Evaluate against a property map.
    pub fn matches(&self, props: &PropertyMap) -> bool {
        match self {
            PropertyPredicate::Any => true,
            PropertyPredicate::Exists(key) => props.contains_key(key),
            PropertyPredicate::Missing(key) => !props.contains_key(key),
            PropertyPredicate::Eq(key, expected) => props
                .get(key)
                .is_some_and(|v| v.compare(expected) == Some(Ordering::Equal)),
            PropertyPredicate::Gt(key, bound) => props
                .get(key)
                .and_then(Value::as_float)
                .is_some_and(|v| v > *bound),
            PropertyPredicate::Gte(key, bound) => props
                .get(key)
                .and_then(Value::as_float)
                .is_some_and(|v| v >= *bound),
            PropertyPredicate::And(all) => all.iter().all(|p| p.matches(props)),
            PropertyPredicate::Or(any) => any.iter().any(|p| p.matches(props)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{props, VertexId};

    #[test]
    fn test_comparison_needs_numeric_value() {
        let map = props([("score", Value::from(2.0)), ("name", Value::from("x"))]);
        assert!(PropertyPredicate::gte("score", 2.0).matches(&map));
        assert!(!PropertyPredicate::gt("score", 2.0).matches(&map));
        assert!(!PropertyPredicate::gt("name", 0.0).matches(&map));
        assert!(!PropertyPredicate::gte("missing", 0.0).matches(&map));
    }

    #[test]
    fn test_identifier_equality() {
        let map = props([("original", Value::from(VertexId(4))), ("pulse", Value::from(2))]);
        let p = PropertyPredicate::And(vec![
            PropertyPredicate::equals("original", VertexId(4)),
            PropertyPredicate::equals("pulse", 2),
        ]);
        assert!(p.matches(&map));
        assert!(!PropertyPredicate::equals("original", VertexId(5)).matches(&map));
    }

    #[test]
    fn test_or_and_missing() {
        let map = props([("a", 1)]);
        let p = PropertyPredicate::Or(vec![
            PropertyPredicate::exists("b"),
            PropertyPredicate::Missing("c".into()),
        ]);
        assert!(p.matches(&map));
        assert!(PropertyPredicate::Any.matches(&map));
    }
}
