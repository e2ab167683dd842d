//! Sorts that report the exact number of key comparisons they perform.

mod hybrid;
mod insertion;
mod merge;

pub use hybrid::{HybridSorter, Threshold, hybrid_sort};
pub use insertion::{InsertionCounting, insertion_sort, insertion_sort_with};
pub use merge::merge;
