use log::debug;
use serde::{Deserialize, Serialize};

use crate::annotations::{AnnotationStore, range::sort_ranges};

/// A single text change: `deleted_len` characters removed at `position`,
/// then `inserted_len` characters inserted there
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOp {
    pub position: usize,
    #[serde(default)]
    pub inserted_len: usize,
    #[serde(default)]
    pub deleted_len: usize,
}

impl EditOp {
    pub fn insert(position: usize, len: usize) -> Self {
        Self {
            position,
            inserted_len: len,
            deleted_len: 0,
        }
    }

    pub fn delete(position: usize, len: usize) -> Self {
        Self {
            position,
            inserted_len: 0,
            deleted_len: len,
        }
    }

    pub fn replace(position: usize, deleted_len: usize, inserted_len: usize) -> Self {
        Self {
            position,
            inserted_len,
            deleted_len,
        }
    }

    /// End of the deleted span, in pre-edit coordinates
    pub fn deleted_end(&self) -> usize {
        self.position + self.deleted_len
    }

    pub fn is_noop(&self) -> bool {
        self.inserted_len == 0 && self.deleted_len == 0
    }

    /// Move an offset that sits at or after the deleted span
    fn shift(&self, offset: usize) -> usize {
        offset - self.deleted_len + self.inserted_len
    }
}

/// New bounds of `start..end` after `op`, or `None` when the range was
/// entirely inside the deleted text.
pub fn adjust_range(start: usize, end: usize, op: EditOp) -> Option<(usize, usize)> {
    let p = op.position;
    let q = op.deleted_end();

    if end <= p {
        return Some((start, end));
    }
    if start >= q {
        return Some((op.shift(start), op.shift(end)));
    }
    if start < p {
        // The edit begins inside the range. If the deletion runs past the
        // range's tail, the range now stops right after the inserted text.
        let new_end = if end >= q { op.shift(end) } else { p + op.inserted_len };
        return Some((start, new_end.max(start + 1)));
    }
    if end > q {
        // Head was deleted: collapse the start onto the edit point
        return Some((p, op.shift(end)));
    }
    None
}

/// New position of a comment after `op`. Comments at or after the edit
/// move by the net shift but never land in front of the edit point.
pub fn adjust_position(position: usize, op: EditOp) -> usize {
    if position < op.position {
        return position;
    }
    (position + op.inserted_len)
        .saturating_sub(op.deleted_len)
        .max(op.position)
}

/// Re-anchor every range and comment in the store through one edit.
///
/// Not idempotent: each logical edit must be applied exactly once.
pub(crate) fn apply_edit(store: &mut AnnotationStore, op: EditOp) {
    if op.is_noop() {
        return;
    }

    let before = store.ranges.len();
    store
        .ranges
        .retain_mut(|range| match adjust_range(range.start, range.end, op) {
            Some((start, end)) => {
                range.start = start;
                range.end = end;
                true
            }
            None => false,
        });
    let removed = before - store.ranges.len();

    for comment in &mut store.comments {
        comment.position = adjust_position(comment.position, op);
    }

    sort_ranges(&mut store.ranges);

    if removed > 0 {
        debug!(
            "edit at {} (+{} -{}) removed {removed} range(s) anchored to deleted text",
            op.position, op.inserted_len, op.deleted_len
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Attribution, RangeKind};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    // insert 5 at 3
    #[case((10, 20), EditOp::insert(3, 5), Some((15, 25)))]
    #[case((0, 2), EditOp::insert(3, 5), Some((0, 2)))]
    #[case((1, 4), EditOp::insert(3, 5), Some((1, 9)))]
    // insertion exactly at a boundary
    #[case((3, 6), EditOp::insert(3, 2), Some((5, 8)))]
    #[case((0, 3), EditOp::insert(3, 2), Some((0, 3)))]
    // delete 10..14
    #[case((11, 13), EditOp::delete(10, 4), None)]
    #[case((10, 14), EditOp::delete(10, 4), None)]
    #[case((12, 18), EditOp::delete(10, 4), Some((10, 14)))]
    #[case((5, 12), EditOp::delete(10, 4), Some((5, 10)))]
    #[case((5, 20), EditOp::delete(10, 4), Some((5, 16)))]
    #[case((14, 20), EditOp::delete(10, 4), Some((10, 16)))]
    #[case((2, 10), EditOp::delete(10, 4), Some((2, 10)))]
    // replace 10..14 with 2 characters
    #[case((5, 12), EditOp::replace(10, 4, 2), Some((5, 12)))]
    #[case((12, 18), EditOp::replace(10, 4, 2), Some((10, 16)))]
    #[case((20, 30), EditOp::replace(10, 4, 2), Some((18, 28)))]
    #[case((11, 13), EditOp::replace(10, 4, 2), None)]
    fn test_adjust_range(
        #[case] range: (usize, usize),
        #[case] op: EditOp,
        #[case] expected: Option<(usize, usize)>,
    ) {
        assert_eq!(adjust_range(range.0, range.1, op), expected);
    }

    #[rstest]
    #[case(2, EditOp::insert(3, 5), 2)]
    #[case(3, EditOp::insert(3, 5), 8)]
    #[case(9, EditOp::insert(3, 5), 14)]
    #[case(12, EditOp::delete(10, 4), 10)]
    #[case(20, EditOp::delete(10, 4), 16)]
    #[case(10, EditOp::delete(10, 4), 10)]
    #[case(0, EditOp::delete(0, 4), 0)]
    #[case(11, EditOp::replace(10, 4, 1), 10)]
    fn test_adjust_position(#[case] position: usize, #[case] op: EditOp, #[case] expected: usize) {
        assert_eq!(adjust_position(position, op), expected);
    }

    #[test]
    fn test_adjusted_range_never_has_zero_width() {
        for start in 0..12 {
            for end in start + 1..14 {
                for position in 0..14 {
                    for deleted in 0..6 {
                        for inserted in 0..3 {
                            let op = EditOp::replace(position, deleted, inserted);
                            if let Some((s, e)) = adjust_range(start, end, op) {
                                assert!(s < e, "{start}..{end} through {op:?} gave {s}..{e}");
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_apply_edit_removes_ranges_inside_deletion_and_moves_comments() {
        let mut store = AnnotationStore::new();
        store.add_range(11, 13, RangeKind::Bold, 1, None, Attribution::default());
        store.add_range(0, 12, RangeKind::Italic, 1, None, Attribution::default());
        let comment = store
            .add_comment(20, "breath", None, Attribution::default())
            .unwrap();

        store.apply_edit(EditOp::delete(10, 4));

        let bounds: Vec<_> = store
            .ranges()
            .iter()
            .map(|r| (r.start, r.end, r.kind.tag()))
            .collect();
        assert_eq!(bounds, vec![(0, 10, "italic")]);
        assert_eq!(store.comment(&comment.id).unwrap().position, 16);
    }

    #[test]
    fn test_apply_edit_resorts_after_collapse() {
        let mut store = AnnotationStore::new();
        store.add_range(8, 30, RangeKind::Section, 1, None, Attribution::default());
        store.add_range(12, 14, RangeKind::Bold, 1, None, Attribution::default());

        // Deleting 5..12 collapses the section onto 5 and shifts bold to 5 as well
        store.apply_edit(EditOp::delete(5, 7));

        let bounds: Vec<_> = store.ranges().iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(bounds, vec![(5, 7), (5, 23)]);
    }

    #[test]
    fn test_apply_edit_is_not_idempotent() {
        let mut store = AnnotationStore::new();
        store.add_range(10, 20, RangeKind::Bold, 1, None, Attribution::default());

        store.apply_edit(EditOp::insert(0, 2));
        store.apply_edit(EditOp::insert(0, 2));

        assert_eq!((store.ranges()[0].start, store.ranges()[0].end), (14, 24));
    }
}
