// Two-way merge with comparison counting

/// Merge two ascending runs into one, counting key comparisons.
///
/// Ties take from `left`, so the merge is stable. One comparison is counted
/// per step while both runs still hold elements; once either run is drained
/// the rest of the other is appended without comparing.
pub fn merge<T: Ord>(left: Vec<T>, right: Vec<T>) -> (Vec<T>, u64) {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut n_compare = 0;

    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => {
                n_compare += 1;
                l <= r
            }
            _ => break,
        };
        if take_left {
            merged.extend(left.next());
        } else {
            merged.extend(right.next());
        }
    }

    // Drained tail, no comparisons
    merged.extend(left);
    merged.extend(right);

    (merged, n_compare)
}
