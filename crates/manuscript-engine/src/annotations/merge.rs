use log::debug;

use crate::annotations::{AnnotationStore, FormattingRange, range::sort_ranges};

/// Fold ranges that share kind, level and data and overlap or touch.
///
/// Ranges are visited in sorted order. Each one is compared with the most
/// recent surviving range of its own group only, so interleaved ranges of
/// other kinds don't block a merge. Every group ends up as disjoint,
/// non-touching intervals, which makes a second pass a no-op.
pub(crate) fn merge_adjacent(store: &mut AnnotationStore) -> usize {
    sort_ranges(&mut store.ranges);

    let before = store.ranges.len();
    let mut merged: Vec<FormattingRange> = Vec::with_capacity(before);

    for range in store.ranges.drain(..) {
        let previous = merged
            .iter_mut()
            .rev()
            .find(|candidate| candidate.mergeable_with(&range))
            .filter(|previous| previous.end >= range.start);

        if let Some(previous) = previous {
            previous.end = previous.end.max(range.end);
            continue;
        }
        merged.push(range);
    }

    sort_ranges(&mut merged);
    store.ranges = merged;

    let folded = before - store.ranges.len();
    if folded > 0 {
        debug!("merge pass folded {folded} range(s)");
    }
    folded
}
