//! Coverage Module
//!
//! Tracks which byte ranges of the data file are durably written.
//!
//! ## Responsibilities
//! - Hold pairwise non-conflicting intervals sorted by start
//! - Find the stored interval conflicting with a probe in O(log n)
//! - Derive the lacking ranges (complement against `[0, size)`)
//!
//! ## Data Structure Choice
//! `BTreeMap<start, end>`. Because stored intervals never overlap or touch,
//! the only candidate that can conflict with a probe is the one with the
//! greatest start `<= probe.end`; a single range lookup plus
//! [`Interval::overlap_cmp`](crate::range::Interval::overlap_cmp) answers
//! "does anything conflict with X?" without a linear scan.

mod set;

pub use set::CoverageSet;
