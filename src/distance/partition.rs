//! Range partition of the node set across workers.


use std::ops::Range;


/// split 0..n into n_workers contiguous ranges of ceil(n / n_workers) indices,
/// the last range may be smaller. Empty ranges are not returned.
pub fn partition(n: usize, n_workers: usize) -> Vec<Range<usize>> {
    assert!(n_workers >= 1, "partition needs at least one worker");
    let batch_size = (n + n_workers - 1) / n_workers;
    let mut ranges = Vec::<Range<usize>>::with_capacity(n_workers);
    let mut start = 0;
    while start < n {
        let end = (start + batch_size).min(n);
        ranges.push(start..end);
        start = end;
    }
    ranges
} // end of partition


//========================================================================


// end of mod tests
