#![forbid(unsafe_code)]

//! State dispatch engine and render driver for the vireo engine.
//!
//! The centerpiece is the [`Store`]: a single schema-less state value plus
//! registries for action handlers, middleware, and watchers. Every change
//! flows through one pipeline:
//!
//! ```text
//! dispatch(kind, params)
//!   └─► middleware chain (history outermost)
//!         └─► handlers fold over scoped subtrees
//!   ◄── Outcome::Commit | Outcome::Cancelled
//! commit ─► watchers ─► App dirty flag ─► flush() renders
//! ```
//!
//! [`App`] couples a store to a view function and a
//! [`HostBackend`](vireo_vdom::HostBackend), coalescing any number of
//! commits into a single reconciliation pass per flush.
//!
//! ```
//! use vireo_runtime::Store;
//! use vireo_state::Value;
//!
//! let mut store = Store::new();
//! store.on("increment", |state, _params| {
//!     Value::from(state.as_number().unwrap_or(0.0) + 1.0)
//! });
//! store.set_state(0.0)?;
//! store.dispatch("increment", Value::Null)?;
//! store.dispatch("increment", Value::Null)?;
//! assert_eq!(store.state()?.as_number(), Some(2.0));
//! store.undo()?;
//! assert_eq!(store.state()?.as_number(), Some(1.0));
//! # Ok::<(), vireo_runtime::StoreError>(())
//! ```

pub mod action;
pub mod driver;
pub mod error;
pub mod history;
pub mod middleware;
pub mod store;

pub use action::{Action, REDO, RESET_HISTORY, SET_STATE, SILENT_PREFIX, UNDO};
pub use driver::App;
pub use error::{AppError, StoreError};
pub use history::{History, HistoryConfig};
pub use middleware::{Middleware, Next, Outcome};
pub use store::{Store, StoreConfig};
