#![forbid(unsafe_code)]

//! Vireo public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from internal crates and offers a lightweight
//! prelude for day-to-day usage.

// --- State re-exports ------------------------------------------------------

pub use vireo_state::path::{Path, Seg};
pub use vireo_state::value::{Value, list, map};
pub use vireo_state::PathError;

// --- Tree re-exports -------------------------------------------------------

pub use vireo_vdom::node::{AttrValue, Element, ElementNode, Key, NodeId, TextNode, VNode};
pub use vireo_vdom::{HostBackend, HostError, HostOp, HostSnapshot, MemRef, MemoryHost, Reconciler, TreeError};

// --- Runtime re-exports ----------------------------------------------------

pub use vireo_runtime::{
    Action, App, AppError, History, HistoryConfig, Middleware, Next, Outcome, Store, StoreConfig,
    StoreError, REDO, RESET_HISTORY, SET_STATE, SILENT_PREFIX, UNDO,
};

// --- Module access ---------------------------------------------------------

pub use vireo_runtime as runtime;
pub use vireo_state as state;
pub use vireo_vdom as vdom;

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Action, App, AppError, Element, HostBackend, Middleware, Next, Outcome, Path, Store,
        StoreConfig, StoreError, VNode, Value,
    };
}
