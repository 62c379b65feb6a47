//! End-to-end tests for spread graph generation and minimization.
//!
//! Spread graphs are compared as sets of `(original, pulse)` nodes and
//! `(from, to)` edges between them, independent of node ids.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use spreading_activation::policy::SpreadingMode;
use spreading_activation::{
    Error, Execution, ExecutionResult, GraphStore, LifecycleState, MemoryGraph, PolicySet,
    PropertyMap, RelevantMinimization, SpreadGraph, SpreadGraphKeys, Value, VertexId, props,
};

// ============================================================================
// Helpers
// ============================================================================

type Node = (VertexId, u32);

fn vertex(graph: &MemoryGraph, label: &str) -> VertexId {
    graph.add_vertex(label, PropertyMap::new()).unwrap()
}

fn link(graph: &MemoryGraph, tail: VertexId, head: VertexId) {
    graph.add_edge(tail, head, "LINK", PropertyMap::new()).unwrap();
}

fn run(graph: &MemoryGraph, mode: SpreadingMode, pulses: u32, seed: VertexId) -> ExecutionResult {
    let policies = PolicySet::builder(pulses).send_mode(mode).build().unwrap();
    let exec = Execution::builder(graph.clone(), policies).build().unwrap();
    exec.activate_vertex(seed, 10.0).unwrap();
    exec.run().unwrap()
}

fn node(spread: &SpreadGraph, id: VertexId) -> Node {
    (spread.original_of(id).unwrap(), spread.pulse_of(id).unwrap())
}

fn nodes(spread: &SpreadGraph) -> BTreeSet<Node> {
    spread
        .graph()
        .vertex_ids()
        .unwrap()
        .into_iter()
        .map(|id| node(spread, id))
        .collect()
}

fn edges(spread: &SpreadGraph) -> BTreeSet<(Node, Node)> {
    spread
        .graph()
        .edge_ids()
        .unwrap()
        .into_iter()
        .map(|id| {
            let edge = spread.graph().edge(id).unwrap().unwrap();
            (node(spread, edge.tail), node(spread, edge.head))
        })
        .collect()
}

/// `A -> B -> C`, BASIC, two pulses, A seeded.
fn chain() -> (MemoryGraph, ExecutionResult, [VertexId; 3]) {
    let graph = MemoryGraph::new();
    let a = vertex(&graph, "Node");
    let b = vertex(&graph, "Node");
    let c = vertex(&graph, "Node");
    link(&graph, a, b);
    link(&graph, b, c);
    let result = run(&graph, SpreadingMode::basic(), 2, a);
    (graph, result, [a, b, c])
}

// ============================================================================
// 1. Generation
// ============================================================================

#[test]
fn test_generate_chain() {
    let (_, result, [a, b, c]) = chain();
    let spread = result.generate_spread_graph().run().unwrap();

    assert_eq!(spread.start_pulse(), 0);
    assert_eq!(spread.end_pulse(), 2);
    assert_eq!(
        nodes(&spread),
        BTreeSet::from([(a, 0), (b, 1), (a, 2), (b, 2), (c, 2)])
    );
    assert_eq!(
        edges(&spread),
        BTreeSet::from([
            ((a, 0), (b, 1)),
            ((b, 1), (a, 2)),
            ((a, 0), (b, 2)),
            ((b, 1), (c, 2)),
        ])
    );
}

#[test]
fn test_generated_labels_and_lookups() {
    let (_, result, [a, b, c]) = chain();
    let spread = result.generate_spread_graph().run().unwrap();

    let b1 = spread.vertex_at(1, b).unwrap().unwrap();
    let label = spread.graph().vertex(b1).unwrap().unwrap().label;
    assert_eq!(label, "Node1");
    assert_eq!(spread.vertex_at(1, c).unwrap(), None);
    assert_eq!(spread.vertices_of(a).unwrap().len(), 2);
    assert_eq!(spread.vertices_at(2).unwrap().len(), 3);

    let starts: Vec<Node> = spread.start_vertices().unwrap().into_iter().map(|id| node(&spread, id)).collect();
    assert_eq!(starts, vec![(a, 0)]);
    let ends: BTreeSet<Node> = spread.end_vertices().unwrap().into_iter().map(|id| node(&spread, id)).collect();
    assert_eq!(ends, BTreeSet::from([(a, 2), (b, 2), (c, 2)]));
}

#[test]
fn test_generated_edges_point_at_original_edges() {
    let (graph, result, [a, b, _]) = chain();
    let spread = result.generate_spread_graph().run().unwrap();

    let ab = graph.incident_edges(a, spreading_activation::Direction::Outgoing).unwrap()[0].id;
    let b1 = spread.vertex_at(1, b).unwrap().unwrap();
    let incoming = spread.in_edges(b1).unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].label, "LINK");
    assert_eq!(spread.original_edge_of(incoming[0].id).unwrap(), ab);
}

#[test]
fn test_generation_window() {
    let (_, result, [a, b, _]) = chain();
    let spread = result.generate_spread_graph().end_pulse(1).run().unwrap();

    assert_eq!(nodes(&spread), BTreeSet::from([(a, 0), (b, 1)]));
    assert_eq!(edges(&spread), BTreeSet::from([((a, 0), (b, 1))]));
}

#[test]
fn test_generation_custom_keys_into_given_graph() {
    let (_, result, [a, _, _]) = chain();
    let target = MemoryGraph::new();
    let keys = SpreadGraphKeys { pulse: "at".into(), original: "of".into() };

    let spread = result.generate_spread_graph().keys(keys.clone()).into(target.clone()).run().unwrap();

    assert_eq!(spread.keys(), &keys);
    assert_eq!(target.vertex_count().unwrap(), 5);
    assert_eq!(target.edge_count().unwrap(), 4);
    let a0 = spread.vertex_at(0, a).unwrap().unwrap();
    assert_eq!(target.vertex_property(a0, "of").unwrap(), Some(Value::Vertex(a)));
    assert_eq!(target.vertex_property(a0, "at").unwrap(), Some(Value::Int(0)));
    assert_eq!(target.vertex_property(a0, "pulse").unwrap(), None);
}

#[test]
fn test_generation_runs_once() {
    let (_, result, _) = chain();
    let generation = result.generate_spread_graph();
    assert_eq!(generation.state(), LifecycleState::NotStarted);

    generation.run().unwrap();
    assert_eq!(generation.state(), LifecycleState::Finished);
    assert!(matches!(generation.run(), Err(Error::InvalidState(_))));
}

#[test]
fn test_interrupted_generation_keeps_start_nodes() {
    let (_, result, [a, _, _]) = chain();
    let generation = result.generate_spread_graph();
    generation.interrupt();

    let spread = generation.run().unwrap();
    assert!(generation.is_interrupted());
    assert_eq!(nodes(&spread), BTreeSet::from([(a, 0)]));
}

// ============================================================================
// 2. Relevant minimization
// ============================================================================

#[test]
fn test_minimize_chain_end() {
    let (_, result, [a, b, c]) = chain();
    let spread = result.generate_spread_graph().run().unwrap();

    let minimal = RelevantMinimization::new(&spread, c).run().unwrap();

    assert_eq!(nodes(&minimal), BTreeSet::from([(a, 0), (b, 1), (c, 2)]));
    assert_eq!(edges(&minimal), BTreeSet::from([((a, 0), (b, 1)), ((b, 1), (c, 2))]));
}

#[test]
fn test_minimize_vertex_with_several_nodes() {
    let (_, result, [a, b, _]) = chain();
    let spread = result.generate_spread_graph().run().unwrap();

    let minimal = RelevantMinimization::new(&spread, b).run().unwrap();

    assert_eq!(nodes(&minimal), BTreeSet::from([(a, 0), (b, 1), (b, 2)]));
    assert_eq!(edges(&minimal), BTreeSet::from([((a, 0), (b, 1)), ((a, 0), (b, 2))]));
}

#[test]
fn test_minimize_respects_window() {
    let (_, result, [a, b, c]) = chain();
    let spread = result.generate_spread_graph().run().unwrap();

    let from_one = RelevantMinimization::new(&spread, c).start_pulse(1).run().unwrap();
    assert_eq!(nodes(&from_one), BTreeSet::from([(b, 1), (c, 2)]));
    assert_eq!(edges(&from_one).len(), 1);

    let until_one = RelevantMinimization::new(&spread, a).end_pulse(1).run().unwrap();
    assert_eq!(nodes(&until_one), BTreeSet::from([(a, 0)]));
    assert!(edges(&until_one).is_empty());
}

#[test]
fn test_minimize_diamond_shares_ancestor() {
    let graph = MemoryGraph::new();
    let a = vertex(&graph, "Node");
    let b = vertex(&graph, "Node");
    let c = vertex(&graph, "Node");
    let d = vertex(&graph, "Node");
    link(&graph, a, b);
    link(&graph, a, c);
    link(&graph, b, d);
    link(&graph, c, d);
    let result = run(&graph, SpreadingMode::forward(), 2, a);
    assert_eq!(result.activation(d, 2).unwrap(), 20.0);

    let spread = result.generate_spread_graph().run().unwrap();
    let minimal = RelevantMinimization::new(&spread, d).run().unwrap();

    assert_eq!(nodes(&minimal), BTreeSet::from([(a, 0), (b, 1), (c, 1), (d, 2)]));
    assert_eq!(
        edges(&minimal),
        BTreeSet::from([
            ((a, 0), (b, 1)),
            ((a, 0), (c, 1)),
            ((b, 1), (d, 2)),
            ((c, 1), (d, 2)),
        ])
    );
}

#[test]
fn test_minimization_keeps_custom_keys_and_runs_once() {
    let (_, result, [_, _, c]) = chain();
    let spread = result.generate_spread_graph().run().unwrap();
    let keys = SpreadGraphKeys { pulse: "p".into(), original: "o".into() };

    let minimization = RelevantMinimization::new(&spread, c).keys(keys);
    let minimal = minimization.run().unwrap();

    let c2 = minimal.vertex_at(2, c).unwrap().unwrap();
    let vertex = minimal.graph().vertex(c2).unwrap().unwrap();
    assert_eq!(vertex.label, "Node2");
    assert_eq!(vertex.properties, props([("o", Value::Vertex(c)), ("p", Value::Int(2))]));
    assert!(matches!(minimization.run(), Err(Error::InvalidState(_))));
}
