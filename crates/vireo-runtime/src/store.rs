#![forbid(unsafe_code)]

//! The dispatch core.
//!
//! A [`Store`] owns the current state and three per-instance registries:
//! action bindings (kind → ordered scoped handlers), the middleware chain,
//! and watchers. Dispatch resolves the bindings for an action kind, folds
//! them into one apply step, threads that step through the middleware chain
//! (first registered outermost), commits the resulting state, and notifies
//! watchers in registration order.
//!
//! The store is uninitialized until the first [`set_state`](Store::set_state);
//! dispatching before that is an error. Later `set_state` calls dispatch the
//! reserved [`SET_STATE`](crate::SET_STATE) override so full-state
//! replacement is observable by middleware, history, and watchers.

use crate::action::{Action, REDO, RESET_HISTORY, SET_STATE, UNDO};
use crate::error::StoreError;
use crate::history::{History, HistoryConfig};
use crate::middleware::{Middleware, Next, Outcome};
use ahash::AHashMap;
use std::rc::Rc;
use tracing::debug;
use vireo_state::{Path, Value};

/// One registered handler, scoped to a subtree of the state.
struct Binding {
    scope: Path,
    handler: Box<dyn Fn(Value, &Value) -> Value>,
}

/// Store construction options.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// History layer configuration; `None` disables undo/redo entirely.
    pub history: Option<HistoryConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history: Some(HistoryConfig::default()),
        }
    }
}

impl StoreConfig {
    /// Disable the history layer.
    #[must_use]
    pub fn without_history() -> Self {
        Self { history: None }
    }

    /// Enable history with a custom undo capacity.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: Some(HistoryConfig { capacity }),
        }
    }
}

/// The dispatch core: state, bindings, middleware, and watchers.
///
/// Registries are per-instance; two stores share nothing. All registration
/// surfaces may be used before or after the first `set_state` and take
/// effect for every subsequent dispatch.
pub struct Store {
    state: Option<Value>,
    bindings: AHashMap<String, Vec<Binding>>,
    chain: Vec<Rc<dyn Middleware>>,
    watchers: Vec<Box<dyn Fn(&Value, &Action)>>,
    history: Option<Rc<History>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store with the default configuration (history enabled,
    /// capacity 20).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with explicit options.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        let mut store = Self {
            state: None,
            bindings: AHashMap::new(),
            chain: Vec::new(),
            watchers: Vec::new(),
            history: None,
        };
        if let Some(history_config) = config.history {
            let history = Rc::new(History::new(history_config));
            // Outermost, so checkpoints capture exactly what commits.
            store.chain.push(history.clone());
            store.history = Some(history);
        }
        store
    }

    /// True once `set_state` has been called.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    /// The current state.
    pub fn state(&self) -> Result<&Value, StoreError> {
        self.state.as_ref().ok_or(StoreError::Uninitialized)
    }

    /// The history layer, if enabled.
    #[must_use]
    pub fn history(&self) -> Option<&History> {
        self.history.as_deref()
    }

    /// Register a handler for `kind`, scoped to the whole state.
    pub fn on(&mut self, kind: impl Into<String>, handler: impl Fn(Value, &Value) -> Value + 'static) {
        self.on_scoped(kind, Path::root(), handler);
    }

    /// Register a handler for `kind`, scoped to the subtree at `scope`.
    ///
    /// Registrations accumulate: multiple handlers for one kind run in
    /// registration order, each seeing the state as left by the previous
    /// one. Handlers receive the scoped subtree (absent subtrees read as
    /// `Value::Null`) and the action params, and return the replacement
    /// subtree.
    pub fn on_scoped(
        &mut self,
        kind: impl Into<String>,
        scope: Path,
        handler: impl Fn(Value, &Value) -> Value + 'static,
    ) {
        self.bindings.entry(kind.into()).or_default().push(Binding {
            scope,
            handler: Box::new(handler),
        });
    }

    /// Append an interceptor to the middleware chain.
    ///
    /// The first added interceptor is outermost. When history is enabled it
    /// occupies the outermost slot and user middleware nests inside it.
    pub fn add_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.chain.push(Rc::new(middleware));
    }

    /// Register a post-commit observer.
    ///
    /// Watchers run in registration order, strictly after a transition
    /// commits, with a shared reference to the new state.
    pub fn watch(&mut self, watcher: impl Fn(&Value, &Action) + 'static) {
        self.watchers.push(Box::new(watcher));
    }

    /// Set or replace the whole state.
    ///
    /// The first call initializes the store directly; every later call
    /// dispatches the reserved [`SET_STATE`](crate::SET_STATE) override, so
    /// it flows through middleware and history like any action. Returns
    /// whether a state change committed.
    pub fn set_state(&mut self, value: impl Into<Value>) -> Result<bool, StoreError> {
        let value = value.into();
        if self.state.is_none() {
            self.state = Some(value);
            return Ok(true);
        }
        self.dispatch(SET_STATE, value)
    }

    /// Set the state from a producer that sees the current state, if any.
    pub fn set_state_with(
        &mut self,
        producer: impl FnOnce(Option<&Value>) -> Value,
    ) -> Result<bool, StoreError> {
        let next = producer(self.state.as_ref());
        self.set_state(next)
    }

    /// Shorthand for dispatching [`UNDO`](crate::UNDO).
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        self.dispatch(UNDO, Value::Null)
    }

    /// Shorthand for dispatching [`REDO`](crate::REDO).
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        self.dispatch(REDO, Value::Null)
    }

    /// Dispatch an action.
    ///
    /// Errors if the store is uninitialized. A kind with no bindings and no
    /// built-in behavior is a no-op: no middleware runs, nothing commits,
    /// no watcher fires, and `Ok(false)` is returned. Otherwise the composed
    /// apply step runs through the middleware chain; on commit the new state
    /// replaces the old one and watchers are notified. Returns whether the
    /// action committed.
    pub fn dispatch(
        &mut self,
        kind: impl Into<String>,
        params: impl Into<Value>,
    ) -> Result<bool, StoreError> {
        let action = Action::new(kind, params);
        let Some(current) = self.state.clone() else {
            return Err(StoreError::Uninitialized);
        };

        let bindings = self.bindings.get(action.kind.as_str());
        let has_builtin = matches!(
            action.kind.as_str(),
            SET_STATE | UNDO | REDO | RESET_HISTORY
        );
        if bindings.is_none() && !has_builtin {
            debug!(kind = %action.kind, "dispatch of unregistered kind is a no-op");
            return Ok(false);
        }

        let apply = |state: Value, action: &Action| -> Result<Value, StoreError> {
            let mut working = state;
            // The override replaces everything; user bindings on the
            // reserved kind still run alongside, on the replaced state.
            if action.kind == SET_STATE {
                working = action.params.clone();
            }
            if let Some(bindings) = bindings {
                for binding in bindings {
                    let scoped = working
                        .get(&binding.scope)
                        .cloned()
                        .unwrap_or(Value::Null);
                    let replacement = (binding.handler)(scoped, &action.params);
                    working.set(&binding.scope, replacement)?;
                }
            }
            Ok(working)
        };

        let outcome = Next::new(&self.chain, &apply).run(current, &action)?;
        match outcome {
            Outcome::Commit(new_state) => {
                debug!(kind = %action.kind, "committed");
                self.state = Some(new_state);
                if let Some(state) = self.state.as_ref() {
                    for watcher in &self.watchers {
                        watcher(state, &action);
                    }
                }
                Ok(true)
            }
            Outcome::Cancelled => {
                debug!(kind = %action.kind, "cancelled by middleware");
                Ok(false)
            }
        }
    }
}
