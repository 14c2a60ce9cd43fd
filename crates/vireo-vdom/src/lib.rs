#![forbid(unsafe_code)]

//! Canonical tree model and diff/patch engine for the vireo engine.
//!
//! A UI is described as a [`VNode`] tree: text leaves and tagged elements
//! with uniquely keyed, explicitly ordered children. The [`Reconciler`]
//! compares the retained tree with a freshly built one and drives a
//! [`HostBackend`] through the minimal structural edits, reusing host nodes
//! whenever type and key match and reordering keyed siblings with a greedy
//! longest-retained-run heuristic.
//!
//! The crate knows nothing about displays: [`HostBackend`] is the only seam,
//! and [`MemoryHost`] implements it in memory for tests.

pub mod error;
pub mod host;
pub mod node;
pub mod order;
pub mod reconcile;

pub use error::{HostError, TreeError};
pub use host::{HostBackend, HostOp, HostSnapshot, MemRef, MemoryHost};
pub use node::{AttrValue, Element, ElementNode, Key, NodeId, TextNode, VNode};
pub use order::{RetainedRun, longest_retained_run};
pub use reconcile::Reconciler;
