//! Coverage set implementation
//!
//! BTreeMap-backed ordered set of disjoint, non-adjacent intervals.

use std::collections::BTreeMap;

use crate::range::Interval;

/// Ordered set of covered byte ranges
///
/// Invariant: entries are pairwise non-conflicting (no overlap, no
/// adjacency) and iterate in ascending `start` order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSet {
    /// start -> end
    ranges: BTreeMap<u64, u64>,
}

impl CoverageSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the stored interval conflicting with `probe`, if any
    pub fn find_conflicting(&self, probe: &Interval) -> Option<Interval> {
        self.ranges
            .range(..=probe.end)
            .next_back()
            .map(|(&start, &end)| Interval { start, end })
            .filter(|stored| stored.conflicts_with(probe))
    }

    /// Remove and return the stored interval conflicting with `probe`
    pub fn take_conflicting(&mut self, probe: &Interval) -> Option<Interval> {
        let found = self.find_conflicting(probe)?;
        self.ranges.remove(&found.start);
        Some(found)
    }

    /// Insert an interval that conflicts with nothing stored.
    ///
    /// Returns false (and leaves the set untouched) if it would conflict.
    pub fn insert(&mut self, interval: Interval) -> bool {
        if self.find_conflicting(&interval).is_some() {
            return false;
        }
        self.ranges.insert(interval.start, interval.end);
        true
    }

    /// Remove exactly `interval`. Returns false if it is not stored as-is.
    pub fn remove(&mut self, interval: &Interval) -> bool {
        match self.ranges.get(&interval.start) {
            Some(&end) if end == interval.end => {
                self.ranges.remove(&interval.start);
                true
            }
            _ => false,
        }
    }

    /// Number of stored intervals
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Drop every interval
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Ascending traversal
    pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.ranges
            .iter()
            .map(|(&start, &end)| Interval { start, end })
    }

    /// Total number of covered bytes
    pub fn covered_bytes(&self) -> u64 {
        self.iter().map(|interval| interval.len()).sum()
    }

    /// Whether the set is exactly one interval spanning `[0, size)`
    pub fn is_complete(&self, size: u64) -> bool {
        self.ranges.len() == 1 && self.ranges.get(&0) == Some(&size)
    }

    /// Gaps in `[0, size)` not covered by the set, left to right.
    ///
    /// With a `limit`, stops as soon as that many gaps were collected.
    pub fn lacking(&self, size: u64, limit: Option<usize>) -> Vec<Interval> {
        let mut gaps = Vec::new();
        if limit == Some(0) {
            return gaps;
        }
        let full = |gaps: &Vec<Interval>| limit.map_or(false, |max| gaps.len() >= max);

        let mut cursor = 0u64;
        for covered in self.iter() {
            if covered.start > cursor {
                gaps.push(Interval::new(cursor, covered.start));
                if full(&gaps) {
                    return gaps;
                }
            }
            cursor = covered.end;
        }

        if cursor < size {
            gaps.push(Interval::new(cursor, size));
        }
        gaps
    }
}
