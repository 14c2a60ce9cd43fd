#![forbid(unsafe_code)]

//! Typed errors for the dispatch core and render driver.

use std::fmt;
use vireo_state::PathError;
use vireo_vdom::TreeError;

/// Errors raised by [`Store`](crate::Store) operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// `dispatch` was called before the first `set_state`.
    Uninitialized,
    /// A binding's scope path could not be navigated.
    Path(PathError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("state has not been set; call set_state first"),
            Self::Path(err) => write!(f, "scope path error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Uninitialized => None,
            Self::Path(err) => Some(err),
        }
    }
}

impl From<PathError> for StoreError {
    fn from(err: PathError) -> Self {
        Self::Path(err)
    }
}

/// Errors raised by [`App`](crate::App), the render driver.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Dispatch failure.
    Store(StoreError),
    /// The view builder produced an invalid tree.
    Tree(TreeError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "view build failed: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Tree(err) => Some(err),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<TreeError> for AppError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}
