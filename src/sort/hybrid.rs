use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::insertion::{InsertionCounting, insertion_sort_with};
use super::merge::merge;
use crate::error::ConfigError;

/// Switch threshold `s`: runs of at most this many elements are handed to
/// insertion sort instead of being split further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Threshold(NonZeroUsize);

impl Threshold {
    /// `s = 1`: plain merge sort with a single-element base case.
    pub const PURE_MERGE: Threshold = Threshold(NonZeroUsize::MIN);

    pub fn new(s: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(s)
            .map(Threshold)
            .ok_or(ConfigError::InvalidThreshold(s))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::PURE_MERGE
    }
}

impl TryFrom<usize> for Threshold {
    type Error = ConfigError;

    fn try_from(s: usize) -> Result<Self, Self::Error> {
        Threshold::new(s)
    }
}

impl From<Threshold> for usize {
    fn from(s: Threshold) -> usize {
        s.get()
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Merge sort that switches to insertion sort at or below the threshold.
///
/// A run of length `len` is split at `mid = len / 2` into `[..mid]` and
/// `[mid..]`, so the right half owns the middle element. Changing that
/// boundary changes recursion shape and every recorded comparison count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HybridSorter {
    threshold: Threshold,
    counting: InsertionCounting,
}

impl HybridSorter {
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            counting: InsertionCounting::default(),
        }
    }

    pub fn with_counting(mut self, counting: InsertionCounting) -> Self {
        self.counting = counting;
        self
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn counting(&self) -> InsertionCounting {
        self.counting
    }

    /// Sort `items` ascending, returning the sorted run and the total number
    /// of key comparisons across every insertion sort and merge.
    pub fn sort<T: Ord>(&self, items: Vec<T>) -> (Vec<T>, u64) {
        if items.len() <= self.threshold.get() {
            return insertion_sort_with(items, self.counting);
        }

        let mut left = items;
        let mid = left.len() / 2;
        let right = left.split_off(mid);

        let (left, n_left) = self.sort(left);
        let (right, n_right) = self.sort(right);
        let (merged, n_merge) = merge(left, right);

        (merged, n_left + n_right + n_merge)
    }
}

/// Hybrid sort with the default (short-circuit) insertion counting.
pub fn hybrid_sort<T: Ord>(items: Vec<T>, s: Threshold) -> (Vec<T>, u64) {
    HybridSorter::new(s).sort(items)
}
