//! Byte ranges
//!
//! Half-open `[start, end)` intervals and the overlap-aware ordering that
//! drives merge-on-write.

use std::cmp::Ordering;
use std::fmt;

/// A half-open byte range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create an interval. `start` must not exceed `end`.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "interval start {} > end {}", start, end);
        Self { start, end }
    }

    /// Number of bytes covered
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Widen `self` to also cover `other`
    pub fn merge(&mut self, other: &Interval) {
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
    }

    /// Three-way ordering where overlapping or touching intervals compare
    /// `Equal`.
    ///
    /// `Less` only when a gap separates `self` from a later `other`,
    /// `Greater` only when a gap separates it from an earlier one.
    /// `[0, 10)` and `[10, 20)` are `Equal`: they conflict and must merge.
    pub fn overlap_cmp(&self, other: &Interval) -> Ordering {
        if self.end < other.start {
            Ordering::Less
        } else if self.start > other.end {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Whether the two intervals overlap or are adjacent
    pub fn conflicts_with(&self, other: &Interval) -> bool {
        self.overlap_cmp(other) == Ordering::Equal
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

impl From<std::ops::Range<u64>> for Interval {
    fn from(range: std::ops::Range<u64>) -> Self {
        Self::new(range.start, range.end)
    }
}
