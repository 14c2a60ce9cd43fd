#![forbid(unsafe_code)]

//! Typed errors for path navigation.
//!
//! Malformed scope paths are usage errors: they fail fast and identify the
//! offending location instead of being silently recovered.

use crate::path::{Path, Seg};
use std::fmt;

/// Errors raised while navigating or writing a scope path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// A segment tried to traverse a value of the wrong shape
    /// (e.g. a key segment applied to a number).
    TypeMismatch {
        /// Prefix of the path that was navigated successfully.
        at: Path,
        /// The segment that could not be applied.
        segment: Seg,
        /// Kind of the value actually found at `at`.
        found: &'static str,
    },
    /// A list index past the end of the list (writes may append at
    /// exactly the current length, never beyond).
    IndexOutOfBounds {
        /// Prefix of the path that was navigated successfully.
        at: Path,
        /// The offending index.
        index: usize,
        /// Length of the list at `at`.
        len: usize,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { at, segment, found } => write!(
                f,
                "cannot apply segment `{segment}` at `{at}`: found {found}"
            ),
            Self::IndexOutOfBounds { at, index, len } => {
                write!(f, "index {index} out of bounds at `{at}` (len {len})")
            }
        }
    }
}

impl std::error::Error for PathError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_type_mismatch() {
        let err = PathError::TypeMismatch {
            at: Path::root().key("a"),
            segment: Seg::Key("b".into()),
            found: "number",
        };
        let text = err.to_string();
        assert!(text.contains(".a"));
        assert!(text.contains("number"));
    }

    #[test]
    fn display_out_of_bounds() {
        let err = PathError::IndexOutOfBounds {
            at: Path::root().key("items"),
            index: 9,
            len: 2,
        };
        let text = err.to_string();
        assert!(text.contains("index 9"));
        assert!(text.contains("len 2"));
    }
}
