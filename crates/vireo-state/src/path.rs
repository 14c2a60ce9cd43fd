#![forbid(unsafe_code)]

//! Scope paths into a state value.
//!
//! A [`Path`] is an ordered sequence of [`Seg`]ments, each either a map key
//! or a list index. Action bindings use paths to restrict a handler's view
//! to a subtree of the full state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a scope path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Map entry access by key.
    Key(String),
    /// List element access by index.
    Index(usize),
}

impl Seg {
    /// Returns the key if this is a key segment.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    /// Returns the index if this is an index segment.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, ".{k}"),
            Seg::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<&str> for Seg {
    fn from(key: &str) -> Self {
        Seg::Key(key.to_owned())
    }
}

impl From<String> for Seg {
    fn from(key: String) -> Self {
        Seg::Key(key)
    }
}

impl From<usize> for Seg {
    fn from(index: usize) -> Self {
        Seg::Index(index)
    }
}

/// An ordered sequence of segments locating a subtree of a state value.
///
/// The empty path addresses the root. Paths are cheap to clone and build
/// fluently:
///
/// ```
/// use vireo_state::Path;
///
/// let path = Path::root().key("todos").index(2).key("done");
/// assert_eq!(path.to_string(), ".todos[2].done");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The empty path addressing the root value.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from pre-existing segments.
    #[must_use]
    pub fn from_segments(segs: Vec<Seg>) -> Self {
        Self(segs)
    }

    /// Append a key segment (builder style).
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(Seg::Key(key.into()));
        self
    }

    /// Append an index segment (builder style).
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Seg::Index(index));
        self
    }

    /// Append a segment in place.
    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }

    /// The underlying segment slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Seg] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for seg in &self.0 {
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
