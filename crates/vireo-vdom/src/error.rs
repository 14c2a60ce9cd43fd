#![forbid(unsafe_code)]

//! Typed errors for tree construction and host mutation.

use std::fmt;

/// Canonical tree construction errors. These are usage errors and fail fast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Two siblings were given the same key.
    DuplicateKey {
        /// Tag of the parent element.
        tag: String,
        /// The colliding key.
        key: String,
    },
    /// `child_order` is not a permutation of the children's keys.
    OrderKeyMismatch {
        /// Tag of the parent element.
        tag: String,
        /// The key present on one side only.
        key: String,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { tag, key } => {
                write!(f, "duplicate sibling key `{key}` under <{tag}>")
            }
            Self::OrderKeyMismatch { tag, key } => write!(
                f,
                "child order of <{tag}> does not match children: key `{key}`"
            ),
        }
    }
}

impl std::error::Error for TreeError {}

/// Errors surfaced by a host backend.
///
/// The reconciler catches these at each edit site, logs them, and continues
/// best-effort; they never abort a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A host reference no longer resolves to a live node.
    UnknownRef(String),
    /// Backend-specific failure.
    Backend(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRef(detail) => write!(f, "unknown host reference: {detail}"),
            Self::Backend(detail) => write!(f, "host backend failure: {detail}"),
        }
    }
}

impl std::error::Error for HostError {}
