#![forbid(unsafe_code)]

//! State value model for the vireo engine.
//!
//! Application state is a schema-less, JSON-shaped [`Value`]: a tagged union
//! of null, booleans, numbers, strings, ordered lists, and insertion-ordered
//! maps. The dispatch core never hands out mutable aliases into a committed
//! state; transformations operate on an owned working copy and splice new
//! subtrees back by value.
//!
//! [`Path`] and [`Seg`] describe locations inside a value. Scoped action
//! handlers receive the subtree a path points at and return its replacement;
//! [`Value::set`] performs the write-back with create-on-write semantics for
//! missing intermediate containers.

pub mod error;
pub mod path;
pub mod value;

pub use error::PathError;
pub use path::{Path, Seg};
pub use value::Value;
