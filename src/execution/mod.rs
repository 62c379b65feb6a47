//! Pulse execution engine.
//!
//! One `Execution` is one run. Seed vertex activation with `activate*`, then
//! call `run()` exactly once. Each pulse runs two phases on a bounded task
//! queue, separated by a drain barrier:
//!
//! ```text
//! pulse p:
//!   phase 1 (emit)    starting vertices ──▶ output_activation[v,p]
//!                                       └─▶ edge_activation[e,p,dir]
//!   ── barrier ──
//!   phase 2 (absorb)  Σ edge_activation ──▶ input_activation[v,p]
//!                                       └─▶ vertex_activation[v,p]
//!   ── barrier ──
//!   abort conditions (OR over all of them)
//! ```
//!
//! Within a phase every unit writes only keys owned by its own vertex or
//! edge at pulse `p`, so units never contend on a property.

mod result;

pub use result::ExecutionResult;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, info_span, trace, warn};

use crate::config::ExecutionConfig;
use crate::keys::{is_valid_activation, PropertyKeys};
use crate::lifecycle::{Cancellation, Lifecycle, LifecycleState};
use crate::model::{Direction, Edge, Value, Vertex, VertexId};
use crate::policy::{Context, PolicySet};
use crate::queue::{Task, TaskQueue};
use crate::storage::{GraphStore, PropertyPredicate};
use crate::{Error, Result};

// ============================================================================
// Execution
// ============================================================================

/// A single spreading activation run over a shared graph.
pub struct Execution {
    graph: Arc<dyn GraphStore>,
    policies: PolicySet,
    keys: PropertyKeys,
    parallel_tasks: usize,
    max_pending: usize,
    pool: Option<Arc<ThreadPool>>,
    lifecycle: Lifecycle,
    /// Last pulse whose phase 1 began.
    started_pulse: AtomicU32,
    /// Last pulse whose phase 2 drained.
    completed_pulse: AtomicU32,
    queue: Arc<Mutex<Option<TaskQueue>>>,
}

/// Why the pulse loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    PulseLimit,
    NoStartingVertices,
    NothingToAbsorb,
    Aborted,
    Interrupted,
}

impl Execution {
    pub fn builder<G: GraphStore>(graph: G, policies: PolicySet) -> ExecutionBuilder {
        Self::builder_shared(Arc::new(graph), policies)
    }

    /// Builder over a graph already behind an `Arc`.
    pub fn builder_shared(graph: Arc<dyn GraphStore>, policies: PolicySet) -> ExecutionBuilder {
        ExecutionBuilder {
            graph,
            policies,
            config: ExecutionConfig::default(),
            pool: None,
        }
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    pub fn keys(&self) -> &PropertyKeys {
        &self.keys
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Pulse currently (or last) being computed; 0 before the run.
    pub fn pulse(&self) -> u32 {
        self.started_pulse.load(Ordering::Acquire)
    }

    /// Last fully computed pulse.
    pub fn completed_pulse(&self) -> u32 {
        self.completed_pulse.load(Ordering::Acquire)
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Seed `value` on every vertex accepted by `filter`. Returns how many
    /// vertices were seeded; an invalid value seeds none.
    ///
    /// `filter` runs before the lifecycle is locked, so it may query the
    /// execution. Fails with `InvalidState` once the run started and with
    /// `PropertyAlreadySet` if a vertex is seeded twice.
    pub fn activate(&self, filter: impl Fn(&Vertex) -> bool, value: f64) -> Result<usize> {
        let mut matching = Vec::new();
        if is_valid_activation(value) {
            for id in self.graph.vertex_ids()? {
                let Some(vertex) = self.graph.vertex(id)? else { continue };
                if filter(&vertex) {
                    matching.push(id);
                }
            }
        }
        self.lifecycle.while_not_started(|| {
            for &id in &matching {
                self.seed(id, value)?;
            }
            debug!(seeded = matching.len(), value, "seeded vertex activation");
            Ok(matching.len())
        })
    }

    /// Seed every vertex matching a property predicate.
    pub fn activate_where(&self, predicate: &PropertyPredicate, value: f64) -> Result<usize> {
        self.lifecycle.while_not_started(|| {
            if !is_valid_activation(value) {
                return Ok(0);
            }
            let matching = self.graph.vertices_where(predicate)?;
            for &id in &matching {
                self.seed(id, value)?;
            }
            debug!(seeded = matching.len(), value, "seeded vertex activation");
            Ok(matching.len())
        })
    }

    /// Seed a single vertex. Returns false if `value` is not a valid
    /// activation.
    pub fn activate_vertex(&self, vertex: VertexId, value: f64) -> Result<bool> {
        self.lifecycle.while_not_started(|| {
            if self.graph.vertex(vertex)?.is_none() {
                return Err(Error::NotFound(format!("vertex {vertex}")));
            }
            if !is_valid_activation(value) {
                return Ok(false);
            }
            self.seed(vertex, value)?;
            Ok(true)
        })
    }

    fn seed(&self, vertex: VertexId, value: f64) -> Result<()> {
        let key = self.keys.vertex_activation(0);
        self.graph.create_vertex_property(vertex, &key, Value::Float(value))
    }

    // ========================================================================
    // Interruption
    // ========================================================================

    /// Stop after the units already dispatched. Idempotent, callable from
    /// any thread through `interrupt_handle`.
    pub fn interrupt(&self) {
        self.interrupt_handle().interrupt();
    }

    pub fn is_interrupted(&self) -> bool {
        self.lifecycle.is_interrupted()
    }

    /// Detached handle that can interrupt this execution from a policy, a
    /// timer thread or anywhere else.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            cancellation: self.lifecycle.cancellation().clone(),
            queue: Arc::clone(&self.queue),
        }
    }

    // ========================================================================
    // Run
    // ========================================================================

    /// Run the pulse loop. Callable once.
    ///
    /// Returns the result view on normal completion, on abort and on
    /// interrupt. A failing unit surfaces as `Error::Pulse` naming the pulse.
    pub fn run(&self) -> Result<ExecutionResult> {
        self.lifecycle.start()?;

        let span = info_span!("spreading_activation", prefix = self.keys.prefix());
        let _enter = span.enter();
        info!(
            pulses = self.policies.pulses(),
            parallel_tasks = self.parallel_tasks,
            "spreading activation started"
        );

        let outcome = self.pulse_loop();
        self.queue.lock().take();
        self.lifecycle.finish()?;

        match outcome {
            Ok(halt) => {
                info!(
                    pulse = self.completed_pulse(),
                    halt = ?halt,
                    "spreading activation finished"
                );
                Ok(self.result())
            }
            Err(err) => {
                warn!(error = %err, "spreading activation failed");
                Err(err)
            }
        }
    }

    /// Result view of whatever has been computed so far.
    pub fn result(&self) -> ExecutionResult {
        ExecutionResult::new(
            Arc::clone(&self.graph),
            self.keys.clone(),
            self.completed_pulse(),
            self.pulse(),
        )
    }

    fn worker_pool(&self) -> Result<Arc<ThreadPool>> {
        if let Some(pool) = &self.pool {
            return Ok(Arc::clone(pool));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.parallel_tasks)
            .thread_name(|i| format!("spreading-activation-{i}"))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("worker pool: {e}")))?;
        Ok(Arc::new(pool))
    }

    fn pulse_loop(&self) -> Result<Halt> {
        // An engine-owned pool is dropped, and its threads joined, on return.
        let pool = self.worker_pool()?;
        let queue = TaskQueue::new(pool, self.parallel_tasks, self.max_pending);
        *self.queue.lock() = Some(queue.clone());

        let pulses = self.policies.pulses();
        loop {
            if self.is_interrupted() {
                return Ok(Halt::Interrupted);
            }
            let pulse = self.pulse() + 1;
            if pulse > pulses {
                return Ok(Halt::PulseLimit);
            }
            self.started_pulse.store(pulse, Ordering::Release);

            let job = Arc::new(PulseJob {
                graph: Arc::clone(&self.graph),
                keys: self.keys.clone(),
                policies: self.policies.clone(),
                pulse,
                cancellation: self.lifecycle.cancellation().clone(),
                queue: queue.clone(),
            });

            match self.run_pulse(&job) {
                Ok(None) => {}
                Ok(Some(halt)) => return Ok(halt),
                Err(source) => {
                    return Err(Error::Pulse {
                        pulse,
                        source: Box::new(source),
                    });
                }
            }
        }
    }

    fn run_pulse(&self, job: &Arc<PulseJob>) -> Result<Option<Halt>> {
        if !job.emit()? {
            return Ok(Some(Halt::NoStartingVertices));
        }
        if self.is_interrupted() {
            return Ok(Some(Halt::Interrupted));
        }
        if !job.absorb()? {
            return Ok(Some(Halt::NothingToAbsorb));
        }
        self.completed_pulse.store(job.pulse, Ordering::Release);

        if self.should_abort(job)? {
            return Ok(Some(Halt::Aborted));
        }
        Ok(None)
    }

    /// Every condition is evaluated; any one of them stops the run.
    fn should_abort(&self, job: &PulseJob) -> Result<bool> {
        let result = self.result();
        let ctx = job.ctx();
        let mut abort = false;
        for condition in self.policies.abort_conditions() {
            abort |= condition.should_abort(&ctx, &result)?;
        }
        if abort {
            warn!(pulse = job.pulse, "abort condition met");
        }
        Ok(abort)
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("prefix", &self.keys.prefix())
            .field("state", &self.state())
            .field("pulse", &self.pulse())
            .field("completed_pulse", &self.completed_pulse())
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct ExecutionBuilder {
    graph: Arc<dyn GraphStore>,
    policies: PolicySet,
    config: ExecutionConfig,
    pool: Option<Arc<ThreadPool>>,
}

impl ExecutionBuilder {
    pub fn config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Run units on a caller-owned pool instead of creating one per run.
    pub fn pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn parallel_tasks(mut self, parallel_tasks: usize) -> Self {
        self.config.parallel_tasks = parallel_tasks;
        self.config.max_pending = self.config.max_pending.max(parallel_tasks);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.property_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> Result<Execution> {
        self.config.validate()?;
        Ok(Execution {
            graph: self.graph,
            policies: self.policies,
            keys: self.config.property_keys(),
            parallel_tasks: self.config.parallel_tasks,
            max_pending: self.config.max_pending,
            pool: self.pool,
            lifecycle: Lifecycle::new("execution"),
            started_pulse: AtomicU32::new(0),
            completed_pulse: AtomicU32::new(0),
            queue: Arc::new(Mutex::new(None)),
        })
    }
}

// ============================================================================
// InterruptHandle
// ============================================================================

/// Cloneable interrupt trigger detached from the `Execution` borrow.
#[derive(Clone)]
pub struct InterruptHandle {
    cancellation: Cancellation,
    queue: Arc<Mutex<Option<TaskQueue>>>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.cancellation.cancel();
        if let Some(queue) = self.queue.lock().as_ref() {
            queue.interrupt();
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptHandle")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

// ============================================================================
// Pulse units
// ============================================================================

/// Everything a unit of one pulse needs, shared by all units of that pulse.
struct PulseJob {
    graph: Arc<dyn GraphStore>,
    keys: PropertyKeys,
    policies: PolicySet,
    pulse: u32,
    cancellation: Cancellation,
    queue: TaskQueue,
}

impl PulseJob {
    fn ctx(&self) -> Context<'_> {
        Context::new(self.graph.as_ref(), &self.keys, &self.policies, self.pulse)
    }

    /// Phase 1. Returns false if no vertex may start.
    fn emit(self: &Arc<Self>) -> Result<bool> {
        let starting = self.policies.pulse_inception().starting_vertices(&self.ctx())?;
        if starting.is_empty() {
            debug!(pulse = self.pulse, "no starting vertices, halting");
            return Ok(false);
        }
        debug!(pulse = self.pulse, vertices = starting.len(), "phase 1: emit");

        let job = Arc::clone(self);
        self.queue.submit_iter(starting.into_iter().map(move |vertex| {
            let job = Arc::clone(&job);
            Ok(Box::new(move || job.emit_vertex(vertex)) as Task)
        }));
        self.queue.await_completed()?;
        Ok(true)
    }

    fn emit_vertex(self: &Arc<Self>, vertex: VertexId) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Ok(());
        }
        let ctx = self.ctx();
        let previous = ctx.activation(vertex, self.pulse - 1)?;
        let mut out = previous * self.policies.attenuation_mode().attenuation(&ctx, vertex)?;
        if !is_valid_activation(out) {
            return Ok(());
        }
        out *= self.policies.branch_mode().branch(&ctx, vertex)?;
        if !is_valid_activation(out) {
            return Ok(());
        }
        self.graph.create_vertex_property(
            vertex,
            &self.keys.output_activation(self.pulse),
            Value::Float(out),
        )?;
        trace!(%vertex, pulse = self.pulse, out, "output activation");

        if self.cancellation.is_cancelled() {
            return Ok(());
        }
        // Eligibility is decided lazily, as the queue pulls each edge.
        let edges = self.graph.incident_edges(vertex, Direction::Both)?;
        let job = Arc::clone(self);
        self.queue.submit_iter(edges.into_iter().filter_map(move |edge| {
            let allowed = job.policies.send_mode().allows(&job.ctx(), vertex, &edge);
            match allowed {
                Ok(true) => {
                    let job = Arc::clone(&job);
                    Some(Ok(Box::new(move || job.emit_edge(vertex, &edge, out)) as Task))
                }
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            }
        }));
        Ok(())
    }

    fn emit_edge(&self, vertex: VertexId, edge: &Edge, out: f64) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Ok(());
        }
        let with_direction = edge.is_tail(vertex);
        let weight = self.policies.edge_weight().weight(&self.ctx(), edge, with_direction)?;
        let value = out * weight;
        if is_valid_activation(value) {
            self.graph.create_edge_property(
                edge.id,
                &self.keys.edge_activation(self.pulse, with_direction),
                Value::Float(value),
            )?;
            trace!(edge = %edge.id, pulse = self.pulse, with_direction, value, "edge activation");
        }
        Ok(())
    }

    /// Phase 2. Returns false if there is nothing to absorb.
    fn absorb(self: &Arc<Self>) -> Result<bool> {
        let previous = self.keys.vertex_activation(self.pulse - 1);
        let mut vertices = self.graph.vertices_where(&PropertyPredicate::exists(previous))?;
        let carried = PropertyPredicate::Or(vec![
            PropertyPredicate::exists(self.keys.edge_activation(self.pulse, true)),
            PropertyPredicate::exists(self.keys.edge_activation(self.pulse, false)),
        ]);
        for edge in self.graph.edges_where(&carried)? {
            vertices.push(edge.tail);
            vertices.push(edge.head);
        }
        vertices.sort_unstable();
        vertices.dedup();

        if vertices.is_empty() {
            debug!(pulse = self.pulse, "nothing to absorb, halting");
            return Ok(false);
        }
        debug!(pulse = self.pulse, vertices = vertices.len(), "phase 2: absorb");

        let job = Arc::clone(self);
        self.queue.submit_iter(vertices.into_iter().map(move |vertex| {
            let job = Arc::clone(&job);
            Ok(Box::new(move || job.absorb_vertex(vertex)) as Task)
        }));
        self.queue.await_completed()?;
        Ok(true)
    }

    fn absorb_vertex(&self, vertex: VertexId) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Ok(());
        }
        let input = self.graph.sum_edge_property(
            vertex,
            Direction::Incoming,
            &self.keys.edge_activation(self.pulse, true),
        )? + self.graph.sum_edge_property(
            vertex,
            Direction::Outgoing,
            &self.keys.edge_activation(self.pulse, false),
        )?;
        if is_valid_activation(input) {
            self.graph.create_vertex_property(
                vertex,
                &self.keys.input_activation(self.pulse),
                Value::Float(input),
            )?;
            trace!(%vertex, pulse = self.pulse, input, "input activation");
        }

        let ctx = self.ctx();
        let x = input + ctx.activation(vertex, self.pulse - 1)?;
        let activation = self.policies.activation_mode().activation(&ctx, vertex, x)?;
        if is_valid_activation(activation) {
            self.graph.create_vertex_property(
                vertex,
                &self.keys.vertex_activation(self.pulse),
                Value::Float(activation),
            )?;
            trace!(%vertex, pulse = self.pulse, activation, "vertex activation");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyMap;
    use crate::policy::{abort, Attenuation, Branch, SpreadingMode};
    use crate::storage::MemoryGraph;

    fn two_vertex_chain() -> (MemoryGraph, VertexId, VertexId) {
        let graph = MemoryGraph::new();
        let a = graph.add_vertex("Node", PropertyMap::new()).unwrap();
        let b = graph.add_vertex("Node", PropertyMap::new()).unwrap();
        graph.add_edge(a, b, "NEXT", PropertyMap::new()).unwrap();
        (graph, a, b)
    }

    fn execution(graph: &MemoryGraph, policies: PolicySet) -> Execution {
        Execution::builder(graph.clone(), policies)
            .parallel_tasks(2)
            .prefix("t")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_validates_config() {
        let graph = MemoryGraph::new();
        let policies = PolicySet::builder(1).build().unwrap();
        let result = Execution::builder(graph, policies).parallel_tasks(0).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_run_is_one_shot() {
        let (graph, a, _) = two_vertex_chain();
        let exec = execution(&graph, PolicySet::builder(1).build().unwrap());
        exec.activate_vertex(a, 1.0).unwrap();
        assert_eq!(exec.state(), LifecycleState::NotStarted);

        exec.run().unwrap();
        assert_eq!(exec.state(), LifecycleState::Finished);
        assert!(matches!(exec.run(), Err(Error::InvalidState(_))));
        assert!(matches!(exec.activate_vertex(a, 1.0), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_invalid_seed_is_ignored() {
        let (graph, a, b) = two_vertex_chain();
        let exec = execution(&graph, PolicySet::builder(1).build().unwrap());
        assert!(!exec.activate_vertex(a, f64::NAN).unwrap());
        assert_eq!(exec.activate(|_| true, -1.0).unwrap(), 0);
        assert!(matches!(exec.activate_vertex(VertexId(99), 1.0), Err(Error::NotFound(_))));
        assert_eq!(exec.activate(|v| v.id == b, 2.0).unwrap(), 1);
    }

    #[test]
    fn test_double_seed_is_rejected() {
        let (graph, a, _) = two_vertex_chain();
        let exec = execution(&graph, PolicySet::builder(1).build().unwrap());
        exec.activate_vertex(a, 1.0).unwrap();
        let err = exec.activate_vertex(a, 2.0).unwrap_err();
        assert!(matches!(err, Error::PropertyAlreadySet { .. }));
    }

    #[test]
    fn test_chain_first_pulse() {
        let (graph, a, b) = two_vertex_chain();
        let exec = execution(&graph, PolicySet::builder(2).build().unwrap());
        exec.activate_vertex(a, 10.0).unwrap();
        let result = exec.run().unwrap();
        let keys = exec.keys();

        let ab = graph.incident_edges(a, Direction::Outgoing).unwrap()[0].id;
        assert_eq!(
            graph.edge_property(ab, &keys.edge_activation(1, true)).unwrap(),
            Some(Value::Float(10.0))
        );
        assert_eq!(
            graph.vertex_property(b, &keys.input_activation(1)).unwrap(),
            Some(Value::Float(10.0))
        );
        assert_eq!(result.activation(b, 1).unwrap(), 10.0);
        assert_eq!(result.pulse(), 2);
    }

    #[test]
    fn test_attenuation_and_branch_scale_output() {
        let (graph, a, b) = two_vertex_chain();
        let policies = PolicySet::builder(1)
            .attenuation_mode(Attenuation::Fixed(0.5))
            .branch_mode(Branch::Degree)
            .build()
            .unwrap();
        let exec = execution(&graph, policies);
        exec.activate_vertex(a, 10.0).unwrap();
        let result = exec.run().unwrap();

        assert_eq!(
            graph.vertex_property(a, &exec.keys().output_activation(1)).unwrap(),
            Some(Value::Float(5.0))
        );
        assert_eq!(result.activation(b, 1).unwrap(), 5.0);
    }

    #[test]
    fn test_halts_without_starting_vertices() {
        let (graph, _, _) = two_vertex_chain();
        let exec = execution(&graph, PolicySet::builder(3).build().unwrap());
        let result = exec.run().unwrap();
        assert_eq!(result.pulse(), 0);
        assert_eq!(exec.pulse(), 1);
        assert_eq!(exec.state(), LifecycleState::Finished);
    }

    #[test]
    fn test_all_abort_conditions_are_evaluated() {
        use std::sync::atomic::AtomicUsize;

        let (graph, a, _) = two_vertex_chain();
        let calls = Arc::new(AtomicUsize::new(0));
        let (c1, c2) = (Arc::clone(&calls), Arc::clone(&calls));
        let policies = PolicySet::builder(5)
            .abort_condition(abort::from_fn(move |ctx, _| {
                c1.fetch_add(1, Ordering::SeqCst);
                Ok(ctx.pulse() >= 2)
            }))
            .abort_condition(abort::from_fn(move |_, _| {
                c2.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            }))
            .build()
            .unwrap();
        let exec = execution(&graph, policies);
        exec.activate_vertex(a, 1.0).unwrap();
        let result = exec.run().unwrap();

        assert_eq!(result.pulse(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_failure_is_wrapped_with_pulse() {
        struct Failing;
        impl crate::policy::EdgeWeight for Failing {
            fn weight(&self, _: &Context<'_>, _: &Edge, _: bool) -> Result<f64> {
                Err(Error::PolicyError("no weight".into()))
            }
        }

        let (graph, a, _) = two_vertex_chain();
        let policies = PolicySet::builder(3).edge_weight(Failing).build().unwrap();
        let exec = execution(&graph, policies);
        exec.activate_vertex(a, 1.0).unwrap();

        let err = exec.run().unwrap_err();
        assert!(matches!(&err, Error::Pulse { pulse: 1, source } if matches!(**source, Error::TaskFailed(_))));
        assert!(matches!(err.root_cause(), Error::PolicyError(_)));
        assert_eq!(exec.state(), LifecycleState::Finished);
    }

    #[test]
    fn test_forward_send_mode_on_chain() {
        let (graph, a, b) = two_vertex_chain();
        let policies = PolicySet::builder(2)
            .send_mode(SpreadingMode::forward())
            .build()
            .unwrap();
        let exec = execution(&graph, policies);
        exec.activate_vertex(a, 10.0).unwrap();
        let result = exec.run().unwrap();

        assert_eq!(result.activation(a, 2).unwrap(), 10.0);
        assert_eq!(result.activation(b, 2).unwrap(), 20.0);
    }

    #[test]
    fn test_caller_supplied_pool() {
        let (graph, a, b) = two_vertex_chain();
        let pool = Arc::new(ThreadPoolBuilder::new().num_threads(1).build().unwrap());
        let exec = Execution::builder(graph.clone(), PolicySet::builder(1).build().unwrap())
            .pool(Arc::clone(&pool))
            .build()
            .unwrap();
        exec.activate_vertex(a, 3.0).unwrap();
        let result = exec.run().unwrap();
        assert_eq!(result.activation(b, 1).unwrap(), 3.0);
        // Still usable after the run.
        assert_eq!(pool.install(|| 1 + 1), 2);
    }
}
