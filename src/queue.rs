//! Bounded task queue with a drain barrier.
//!
//! Sources are lazy sequences of work units. The queue pulls from all
//! submitted sources round-robin and runs at most `max_parallel` units at a
//! time on a rayon pool. `await_completed` is the phase barrier: it returns
//! once every source is exhausted and every dispatched unit has finished.
//!
//! ```text
//!  submit(src) ──▶ sources ──pull──▶ pool.spawn(unit) ──▶ completed ──▶ await_completed
//!                     ▲                     │
//!                     └── units may submit ─┘
//! ```
//!
//! ## Bounds
//!
//! - `running + pulling < max_parallel`: units executing right now, plus
//!   sources being pulled.
//! - `running + pulling + completed < max_pending`: completions nobody has
//!   collected yet. Once reached, pulling stops until `await_completed`
//!   drains them.
//!
//! Pulling is fallible and runs without the queue lock held, so a source may
//! call back into the queue. A source yielding `Err` or panicking produces a
//! pre-failed completion instead of an error at the pull site.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};
use rayon::ThreadPool;
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// One deferred unit of work.
pub type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// A lazy, single-pass sequence of units. Pulling may fail.
pub type TaskSource = Box<dyn Iterator<Item = Result<Task>> + Send + 'static>;

/// Handle to a bounded queue. Clones share the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    pool: Arc<ThreadPool>,
    max_parallel: usize,
    max_pending: usize,
    state: Mutex<QueueState>,
    changed: Condvar,
}

#[derive(Default)]
struct QueueState {
    sources: VecDeque<TaskSource>,
    running: usize,
    /// Sources popped for a pull that runs outside the lock.
    pulling: usize,
    completed: VecDeque<Result<()>>,
    interrupted: bool,
}

impl TaskQueue {
    /// `max_parallel` is clamped to at least 1 and `max_pending` to at least
    /// `max_parallel`.
    pub fn new(pool: Arc<ThreadPool>, max_parallel: usize, max_pending: usize) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            inner: Arc::new(QueueInner {
                pool,
                max_parallel,
                max_pending: max_pending.max(max_parallel),
                state: Mutex::new(QueueState::default()),
                changed: Condvar::new(),
            }),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.inner.max_parallel
    }

    /// Enqueue a source and start dispatching from it. Clears a previous
    /// interrupt.
    pub fn submit(&self, source: TaskSource) {
        let mut state = self.inner.state.lock();
        state.interrupted = false;
        state.sources.push_back(source);
        self.inner.dispatch(&mut state);
    }

    /// Convenience wrapper over `submit` for any sendable iterator.
    pub fn submit_iter<I>(&self, tasks: I)
    where
        I: IntoIterator<Item = Result<Task>>,
        I::IntoIter: Send + 'static,
    {
        self.submit(Box::new(tasks.into_iter()));
    }

    /// Drop every source not yet pulled. Units already dispatched still run
    /// to completion.
    pub fn interrupt(&self) {
        let mut state = self.inner.state.lock();
        state.interrupted = true;
        let dropped = state.sources.len();
        state.sources.clear();
        debug!(dropped_sources = dropped, running = state.running, "task queue interrupted");
        self.inner.changed.notify_all();
    }

    /// True after `interrupt` until the next `submit`.
    pub fn is_interrupted(&self) -> bool {
        self.inner.state.lock().interrupted
    }

    /// Nothing queued, running, or waiting to be collected.
    pub fn has_completed(&self) -> bool {
        let state = self.inner.state.lock();
        state.sources.is_empty()
            && state.running == 0
            && state.pulling == 0
            && state.completed.is_empty()
    }

    /// Block until all sources are exhausted and all dispatched units have
    /// finished.
    ///
    /// The first failure stops further pulling; in-flight units are drained
    /// before it is returned as `Error::TaskFailed`. Later failures are
    /// logged and dropped.
    pub fn await_completed(&self) -> Result<()> {
        let mut first_failure: Option<Error> = None;
        let mut state = self.inner.state.lock();

        loop {
            while let Some(outcome) = state.completed.pop_front() {
                if let Err(err) = outcome {
                    if first_failure.is_none() {
                        warn!(error = %err, running = state.running, "task failed, draining in-flight units");
                        first_failure = Some(err);
                    } else {
                        debug!(error = %err, "suppressing additional task failure");
                    }
                }
            }

            if first_failure.is_some() {
                state.sources.clear();
            } else {
                self.inner.dispatch(&mut state);
            }

            // Pull failures land in `completed` without anything to wake us.
            if !state.completed.is_empty() {
                continue;
            }
            if state.running == 0
                && state.pulling == 0
                && (state.sources.is_empty() || state.interrupted)
            {
                break;
            }
            self.inner.changed.wait(&mut state);
        }
        drop(state);

        match first_failure {
            Some(err) => Err(Error::TaskFailed(Box::new(err))),
            None => Ok(()),
        }
    }
}

impl QueueInner {
    /// Pull units round-robin and spawn them while the bounds allow.
    ///
    /// Sources are pulled with the lock released, since a pull may run
    /// policy code that calls back into the queue. A source being pulled
    /// counts against both bounds.
    fn dispatch(self: &Arc<Self>, state: &mut MutexGuard<'_, QueueState>) {
        while !state.interrupted
            && state.running + state.pulling < self.max_parallel
            && state.running + state.pulling + state.completed.len() < self.max_pending
        {
            let Some(mut source) = state.sources.pop_front() else { break };
            state.pulling += 1;
            let pulled = MutexGuard::unlocked(state, || pull_guarded(&mut source));
            state.pulling -= 1;
            self.changed.notify_all();

            let next = match pulled {
                Ok(Some(next)) => next,
                Ok(None) => continue,
                Err(err) => {
                    // The source is left in an unknown state; drop it.
                    debug!(error = %err, "pulling next unit panicked");
                    state.completed.push_back(Err(err));
                    continue;
                }
            };
            if state.interrupted {
                trace!("dropping unit pulled while interrupted");
                break;
            }
            state.sources.push_back(source);

            match next {
                Ok(task) => {
                    state.running += 1;
                    trace!(running = state.running, "dispatching unit");
                    let inner = Arc::clone(self);
                    self.pool.spawn(move || {
                        let outcome = run_guarded(task);
                        inner.finished(outcome);
                    });
                }
                Err(err) => {
                    debug!(error = %err, "pulling next unit failed");
                    state.completed.push_back(Err(err));
                }
            }
        }
    }

    fn finished(self: &Arc<Self>, outcome: Result<()>) {
        let mut state = self.state.lock();
        state.running -= 1;
        state.completed.push_back(outcome);
        self.dispatch(&mut state);
        self.changed.notify_all();
    }
}

fn pull_guarded(source: &mut TaskSource) -> Result<Option<Result<Task>>> {
    panic::catch_unwind(AssertUnwindSafe(|| source.next()))
        .map_err(|payload| Error::TaskPanicked(panic_message(payload.as_ref())))
}

fn run_guarded(task: Task) -> Result<()> {
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(outcome) => outcome,
        Err(payload) => Err(Error::TaskPanicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
