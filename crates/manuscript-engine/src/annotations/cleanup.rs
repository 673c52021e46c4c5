use log::debug;
use serde::Serialize;

use crate::annotations::{AnnotationStore, range::sort_ranges};
use crate::text::char_len;

/// What a cleanup pass had to correct
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub dropped_ranges: usize,
    pub clamped_ranges: usize,
    pub dropped_comments: usize,
}

impl CleanupReport {
    /// Nothing was dropped or clamped
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Enforce the structural invariants against a document of `document_len` characters.
///
/// Degenerate ranges and anything starting at or past the end are dropped,
/// range ends past the document are clamped, and ranges are re-sorted.
pub(crate) fn cleanup(store: &mut AnnotationStore, document_len: usize) -> CleanupReport {
    let mut report = CleanupReport::default();

    store.ranges.retain_mut(|range| {
        if range.start >= range.end || range.start >= document_len {
            report.dropped_ranges += 1;
            return false;
        }
        if range.end > document_len {
            range.end = document_len;
            report.clamped_ranges += 1;
        }
        true
    });

    let comments_before = store.comments.len();
    store
        .comments
        .retain(|comment| comment.position < document_len);
    report.dropped_comments = comments_before - store.comments.len();

    sort_ranges(&mut store.ranges);

    if !report.is_clean() {
        debug!(
            "cleanup against length {document_len}: dropped {} range(s), clamped {}, dropped {} comment(s)",
            report.dropped_ranges, report.clamped_ranges, report.dropped_comments
        );
    }
    report
}

pub(crate) fn reconcile_to_length(store: &mut AnnotationStore, new_text: &str) -> CleanupReport {
    cleanup(store, char_len(new_text))
}
