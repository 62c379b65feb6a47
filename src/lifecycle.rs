//! One-shot run lifecycle shared by the engine and the spread graph builders.
//!
//! ```text
//! NotStarted ──start()──▶ Running ──finish()──▶ Finished
//! ```
//!
//! Illegal transitions are rejected with `Error::InvalidState`. The
//! interrupted flag is latched separately and readable in any state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Error, Result};

/// Where a one-shot run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    NotStarted,
    Running,
    Finished,
}

/// Cooperative cancellation token. Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Guarded state machine plus a latched interrupt.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    what: &'static str,
    state: Mutex<LifecycleState>,
    cancellation: Cancellation,
}

impl Lifecycle {
    pub(crate) fn new(what: &'static str) -> Self {
        Self {
            what,
            state: Mutex::new(LifecycleState::NotStarted),
            cancellation: Cancellation::new(),
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// `NotStarted → Running`.
    pub(crate) fn start(&self) -> Result<()> {
        self.transition(LifecycleState::NotStarted, LifecycleState::Running)
    }

    /// `Running → Finished`.
    pub(crate) fn finish(&self) -> Result<()> {
        self.transition(LifecycleState::Running, LifecycleState::Finished)
    }

    /// Run `f` only while not started, holding the state lock so `start`
    /// cannot race it. `f` must not call back into the owner's lifecycle.
    pub(crate) fn while_not_started<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let state = self.state.lock();
        if *state != LifecycleState::NotStarted {
            return Err(Error::InvalidState(format!("{} already started", self.what)));
        }
        f()
    }

    pub(crate) fn interrupt(&self) {
        self.cancellation.cancel();
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub(crate) fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        let mut state = self.state.lock();
        if *state != from {
            let reason = match *state {
                LifecycleState::NotStarted => "not started",
                LifecycleState::Running => "already started",
                LifecycleState::Finished => "already finished",
            };
            return Err(Error::InvalidState(format!("{} {reason}", self.what)));
        }
        *state = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_transitions() {
        let lifecycle = Lifecycle::new("execution");
        assert_eq!(lifecycle.state(), LifecycleState::NotStarted);

        lifecycle.start().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Running);
        assert!(matches!(lifecycle.start(), Err(Error::InvalidState(_))));

        lifecycle.finish().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Finished);
        assert!(matches!(lifecycle.start(), Err(Error::InvalidState(_))));
        assert!(matches!(lifecycle.finish(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_finish_requires_start() {
        let lifecycle = Lifecycle::new("generation");
        assert!(matches!(lifecycle.finish(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_guarded_setup_only_before_start() {
        let lifecycle = Lifecycle::new("execution");
        assert_eq!(lifecycle.while_not_started(|| Ok(7)).unwrap(), 7);

        lifecycle.start().unwrap();
        let late = lifecycle.while_not_started(|| Ok(()));
        assert!(matches!(late, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_interrupt_is_latched_in_any_state() {
        let lifecycle = Lifecycle::new("execution");
        lifecycle.interrupt();
        assert!(lifecycle.is_interrupted());
        lifecycle.start().unwrap();
        lifecycle.finish().unwrap();
        assert!(lifecycle.is_interrupted());
    }

    #[test]
    fn test_cancellation_clones_share_flag() {
        let token = Cancellation::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
