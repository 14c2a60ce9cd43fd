#![forbid(unsafe_code)]

//! Actions: named state transformation requests.

use vireo_state::Value;

/// Reserved kind that replaces the entire state unconditionally.
///
/// [`Store::set_state`](crate::Store::set_state) dispatches this after the
/// first initialization, so overrides flow through middleware, history, and
/// watchers like any other action.
pub const SET_STATE: &str = "@state/set";

/// Reserved kind: restore the most recent history checkpoint.
pub const UNDO: &str = "@history/undo";

/// Reserved kind: reapply the most recently undone state.
pub const REDO: &str = "@history/redo";

/// Reserved kind: clear both history stacks without touching current state.
pub const RESET_HISTORY: &str = "@history/reset";

/// Kinds starting with this prefix never push a history checkpoint.
///
/// Transient or purely informational actions can change state without
/// polluting undo granularity.
pub const SILENT_PREFIX: &str = "~";

/// A named state transformation request with parameters.
#[derive(Debug, Clone)]
pub struct Action {
    /// Action kind, resolved against registered bindings.
    pub kind: String,
    /// Free-form parameters passed to every handler.
    pub params: Value,
}

impl Action {
    /// Build an action.
    #[must_use]
    pub fn new(kind: impl Into<String>, params: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            params: params.into(),
        }
    }

    /// True if this action is excluded from history checkpoints.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.kind.starts_with(SILENT_PREFIX)
    }

    /// True for the built-in history control kinds.
    #[must_use]
    pub fn is_history_control(&self) -> bool {
        matches!(self.kind.as_str(), UNDO | REDO | RESET_HISTORY)
    }
}
