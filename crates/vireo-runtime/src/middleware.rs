#![forbid(unsafe_code)]

//! The middleware chain.
//!
//! Middleware are interceptors wrapped around the action-application step.
//! The store keeps them as an explicit ordered list and folds the list into
//! a nested call chain per dispatch: the first registered interceptor is
//! outermost and wraps all the others; the innermost [`Next`] invokes the
//! composed apply step.
//!
//! An interceptor may rewrite the state it passes down, alter or discard the
//! outcome it gets back, or skip [`Next::run`] entirely — a deliberate
//! cancellation, not an error: no state change commits and no watcher fires.

use crate::action::Action;
use crate::error::StoreError;
use std::rc::Rc;
use vireo_state::Value;

/// Result of running (the remainder of) a dispatch chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The chain produced a new state to commit.
    Commit(Value),
    /// Some interceptor cancelled the action.
    Cancelled,
}

impl Outcome {
    /// True if the action was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// The composed apply step at the center of the chain.
pub(crate) type ApplyFn<'a> = &'a dyn Fn(Value, &Action) -> Result<Value, StoreError>;

/// Continuation for the remaining chain.
///
/// Consumed by `run`; an interceptor that drops it without running it
/// cancels the action (callers observe [`Outcome::Cancelled`] only if the
/// interceptor returns it, which is the conventional way to cancel).
pub struct Next<'a> {
    chain: &'a [Rc<dyn Middleware>],
    apply: ApplyFn<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Rc<dyn Middleware>], apply: ApplyFn<'a>) -> Self {
        Self { chain, apply }
    }

    /// Run the rest of the chain with a (possibly rewritten) state.
    pub fn run(self, state: Value, action: &Action) -> Result<Outcome, StoreError> {
        match self.chain.split_first() {
            Some((head, rest)) => head.intercept(state, action, Next::new(rest, self.apply)),
            None => (self.apply)(state, action).map(Outcome::Commit),
        }
    }
}

/// An interceptor around the action-application step.
pub trait Middleware {
    /// Inspect or rewrite the dispatch, then (usually) continue with `next`.
    fn intercept(
        &self,
        state: Value,
        action: &Action,
        next: Next<'_>,
    ) -> Result<Outcome, StoreError>;
}
