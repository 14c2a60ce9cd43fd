#![forbid(unsafe_code)]

//! Bounded undo/redo history, layered as middleware.
//!
//! [`History`] sits outermost in the dispatch chain and maintains two
//! stacks of full state checkpoints:
//!
//! ```text
//! dispatch("edit")            undo()                    dispatch("edit2")
//! past: [s0, s1]   ──►   past: [s0]          ──►   past: [s0, s1]
//! future: []             future: [s2]              future: []   (branch discarded)
//! ```
//!
//! Semantics follow linear history: any committed, non-silent, non-history
//! action pushes the pre-transition state onto `past` and clears `future`,
//! so redo is only possible immediately after an undo. `past` is bounded;
//! once it grows past the configured capacity the oldest checkpoint is
//! evicted FIFO. Kinds carrying the [`SILENT_PREFIX`](crate::SILENT_PREFIX)
//! marker change state without leaving a checkpoint.
//!
//! Undo and redo themselves flow through the rest of the chain with the
//! swapped state, so user bindings registered on the reserved kinds run
//! alongside the swap and watchers observe it like any commit.

use crate::action::{Action, REDO, RESET_HISTORY, UNDO};
use crate::error::StoreError;
use crate::middleware::{Middleware, Next, Outcome};
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::trace;
use vireo_state::Value;

/// History layer configuration.
#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    /// Maximum depth of the undo stack.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 20 }
    }
}

/// Bounded undo/redo stacks over full state checkpoints.
///
/// Interior mutability keeps the store's middleware list uniform: the chain
/// holds `Rc<dyn Middleware>` and the store keeps a second handle for
/// inspection.
#[derive(Debug)]
pub struct History {
    past: RefCell<VecDeque<Value>>,
    future: RefCell<Vec<Value>>,
    capacity: usize,
}

impl History {
    /// Create an empty history with the given configuration.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            past: RefCell::new(VecDeque::new()),
            future: RefCell::new(Vec::new()),
            capacity: config.capacity,
        }
    }

    /// True if an undo checkpoint is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.borrow().is_empty()
    }

    /// True if a redo checkpoint is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.borrow().is_empty()
    }

    /// Depth of the undo stack.
    #[must_use]
    pub fn past_depth(&self) -> usize {
        self.past.borrow().len()
    }

    /// Depth of the redo stack.
    #[must_use]
    pub fn future_depth(&self) -> usize {
        self.future.borrow().len()
    }

    /// Push a checkpoint, evicting the oldest once over capacity, and
    /// discard the redo branch.
    fn record(&self, pre_state: Value) {
        let mut past = self.past.borrow_mut();
        if past.len() > self.capacity {
            past.pop_front();
        }
        past.push_back(pre_state);
        self.future.borrow_mut().clear();
    }
}

impl Middleware for History {
    fn intercept(
        &self,
        state: Value,
        action: &Action,
        next: Next<'_>,
    ) -> Result<Outcome, StoreError> {
        match action.kind.as_str() {
            UNDO => {
                let Some(restored) = self.past.borrow_mut().pop_back() else {
                    // Nothing to undo; pass through unchanged.
                    return next.run(state, action);
                };
                self.future.borrow_mut().push(state);
                match next.run(restored.clone(), action)? {
                    Outcome::Commit(new_state) => Ok(Outcome::Commit(new_state)),
                    Outcome::Cancelled => {
                        // An inner interceptor vetoed the swap; put it back.
                        self.future.borrow_mut().pop();
                        self.past.borrow_mut().push_back(restored);
                        Ok(Outcome::Cancelled)
                    }
                }
            }
            REDO => {
                let Some(restored) = self.future.borrow_mut().pop() else {
                    return next.run(state, action);
                };
                self.past.borrow_mut().push_back(state);
                match next.run(restored.clone(), action)? {
                    Outcome::Commit(new_state) => Ok(Outcome::Commit(new_state)),
                    Outcome::Cancelled => {
                        self.past.borrow_mut().pop_back();
                        self.future.borrow_mut().push(restored);
                        Ok(Outcome::Cancelled)
                    }
                }
            }
            RESET_HISTORY => {
                self.past.borrow_mut().clear();
                self.future.borrow_mut().clear();
                next.run(state, action)
            }
            _ if action.is_silent() => next.run(state, action),
            _ => {
                let pre_state = state.clone();
                let outcome = next.run(state, action)?;
                if let Outcome::Commit(_) = outcome {
                    trace!(kind = %action.kind, depth = self.past_depth() + 1, "history checkpoint");
                    self.record(pre_state);
                }
                Ok(outcome)
            }
        }
    }
}
