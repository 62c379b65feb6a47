//! Built-in abort conditions.
//!
//! Conditions are checked after each completed pulse with a context whose
//! pulse is the one just finished.

use std::fmt;

use super::{AbortCondition, Context};
use crate::execution::ExecutionResult;
use crate::Result;

/// Abort once more than `n` vertices hold activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxActivatedVertices(pub usize);

impl AbortCondition for MaxActivatedVertices {
    fn should_abort(&self, ctx: &Context<'_>, result: &ExecutionResult) -> Result<bool> {
        Ok(result.activated_vertices(ctx.pulse())?.len() > self.0)
    }
}

/// Abort once total activation falls below a floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationBelow(pub f64);

impl AbortCondition for ActivationBelow {
    fn should_abort(&self, ctx: &Context<'_>, result: &ExecutionResult) -> Result<bool> {
        let total: f64 = result
            .activated_vertices(ctx.pulse())?
            .iter()
            .map(|(_, activation)| activation)
            .sum();
        Ok(total < self.0)
    }
}

/// Closure-backed condition, see `from_fn`.
pub struct FnAbortCondition<F>(F);

impl<F> fmt::Debug for FnAbortCondition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnAbortCondition")
    }
}

impl<F> AbortCondition for FnAbortCondition<F>
where
    F: Fn(&Context<'_>, &ExecutionResult) -> Result<bool> + Send + Sync,
{
    fn should_abort(&self, ctx: &Context<'_>, result: &ExecutionResult) -> Result<bool> {
        (self.0)(ctx, result)
    }
}

/// Wrap a closure as an abort condition.
pub fn from_fn<F>(f: F) -> FnAbortCondition<F>
where
    F: Fn(&Context<'_>, &ExecutionResult) -> Result<bool> + Send + Sync,
{
    FnAbortCondition(f)
}
