#![forbid(unsafe_code)]

//! Keyed-reorder heuristic.
//!
//! Given two key sequences that are permutations of each other, find the
//! longest run of keys that is contiguous in both and in the same relative
//! order. The caller leaves that run in place and moves everything else:
//! keys ordered before the run are prepended (in reverse, each before the
//! previous front), keys after it are appended. One host mutation per moved
//! key; greedy, not an LCS solver, so the move count is small but not
//! guaranteed globally minimal.
//!
//! The scan tries every start index in `target`, extends the match while
//! corresponding keys agree, and stops early once a run covers at least half
//! the sequence (no longer run can exist). Worst case is quadratic; the
//! early exit makes the common nearly-sorted case close to linear.

use crate::node::Key;
use ahash::AHashMap;

/// The run of keys shared, contiguously and in order, by both sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetainedRun {
    /// Start of the run in the current sequence.
    pub current_start: usize,
    /// Start of the run in the target sequence.
    pub target_start: usize,
    /// Run length; `0` only for empty inputs.
    pub len: usize,
}

impl RetainedRun {
    /// The degenerate run for empty sequences.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            current_start: 0,
            target_start: 0,
            len: 0,
        }
    }

    /// True if no keys are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Find the longest retained run between `current` and `target`.
///
/// Both slices must be permutations of each other; keys missing from
/// `current` simply never extend a run. Ties keep the leftmost (first
/// found) maximal run.
#[must_use]
pub fn longest_retained_run(current: &[Key], target: &[Key]) -> RetainedRun {
    let n = target.len();
    if n == 0 || current.is_empty() {
        return RetainedRun::empty();
    }

    let position: AHashMap<&Key, usize> = current
        .iter()
        .enumerate()
        .map(|(i, key)| (key, i))
        .collect();

    let mut best = RetainedRun::empty();
    for start in 0..n {
        let Some(&pos) = position.get(&target[start]) else {
            continue;
        };
        let mut len = 1;
        while start + len < n
            && pos + len < current.len()
            && current[pos + len] == target[start + len]
        {
            len += 1;
        }
        if len > best.len {
            best = RetainedRun {
                current_start: pos,
                target_start: start,
                len,
            };
            // A run spanning half the keys cannot be beaten.
            if 2 * best.len >= n {
                break;
            }
        }
    }
    best
}
