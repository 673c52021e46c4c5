use log::debug;
use serde_json::Value;

use crate::annotations::{
    Attribution, CleanupReport, Comment, CommentId, EditNotification, EditOp, FormattingRange,
    RangeId, RangeKind, range::sort_ranges,
};
use crate::error::AnnotationError;

/// Canonical collection of formatting ranges and comments for one document
///
/// Ranges are kept sorted by `(start, width)` after every mutating call.
/// The store never sees the text itself; callers pass the document length
/// whenever validation needs it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationStore {
    pub(crate) ranges: Vec<FormattingRange>,
    pub(crate) comments: Vec<Comment>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All ranges in sorted order
    pub fn ranges(&self) -> &[FormattingRange] {
        &self.ranges
    }

    /// All comments in creation order
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn range(&self, id: &RangeId) -> Option<&FormattingRange> {
        self.ranges.iter().find(|range| &range.id == id)
    }

    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| &comment.id == id)
    }

    /// Number of annotations, ranges and comments together
    pub fn len(&self) -> usize {
        self.ranges.len() + self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.comments.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.comments.clear();
    }

    /// Add a range, folding every overlapping range of the same type into it.
    ///
    /// Touching counts as overlapping, so same-type formatting never ends up
    /// as adjacent fragments. Ranges of other types are left alone. A zero
    /// `level` is stored as 1.
    pub fn try_add_range(
        &mut self,
        start: usize,
        end: usize,
        kind: RangeKind,
        level: u32,
        data: Option<Value>,
        attribution: Attribution,
    ) -> Result<FormattingRange, AnnotationError> {
        if start >= end {
            return Err(AnnotationError::InvalidBounds { start, end });
        }

        let mut merged_start = start;
        let mut merged_end = end;
        let before = self.ranges.len();
        self.ranges.retain(|existing| {
            if existing.kind.same_type(&kind) && existing.overlaps(start, end) {
                merged_start = merged_start.min(existing.start);
                merged_end = merged_end.max(existing.end);
                false
            } else {
                true
            }
        });
        let folded = before - self.ranges.len();
        if folded > 0 {
            debug!("folded {folded} overlapping {kind} range(s) into {merged_start}..{merged_end}");
        }

        let range = FormattingRange::new(merged_start, merged_end, kind, data, attribution)
            .with_level(level);
        self.ranges.push(range.clone());
        sort_ranges(&mut self.ranges);
        Ok(range)
    }

    /// [`AnnotationStore::try_add_range`], returning `None` on rejection
    pub fn add_range(
        &mut self,
        start: usize,
        end: usize,
        kind: RangeKind,
        level: u32,
        data: Option<Value>,
        attribution: Attribution,
    ) -> Option<FormattingRange> {
        self.try_add_range(start, end, kind, level, data, attribution)
            .map_err(|e| debug!("add_range rejected: {e}"))
            .ok()
    }

    /// Remove a range by id; `false` if no such range
    pub fn remove_range(&mut self, id: &RangeId) -> bool {
        let before = self.ranges.len();
        self.ranges.retain(|range| &range.id != id);
        before != self.ranges.len()
    }

    /// Every range with `start <= position <= end`
    pub fn ranges_at(&self, position: usize) -> Vec<&FormattingRange> {
        self.ranges
            .iter()
            .filter(|range| range.contains(position))
            .collect()
    }

    /// Every range overlapping `start..end`, touching included
    pub fn ranges_overlapping(&self, start: usize, end: usize) -> Vec<&FormattingRange> {
        self.ranges
            .iter()
            .filter(|range| range.overlaps(start, end))
            .collect()
    }

    /// Distinct kinds active at a caret position, in range order
    pub fn active_kinds_at(&self, position: usize) -> Vec<&RangeKind> {
        let mut kinds: Vec<&RangeKind> = Vec::new();
        for range in self.ranges_at(position) {
            if !kinds.contains(&&range.kind) {
                kinds.push(&range.kind);
            }
        }
        kinds
    }

    pub fn try_add_comment(
        &mut self,
        position: usize,
        text: &str,
        author: Option<String>,
        attribution: Attribution,
    ) -> Result<Comment, AnnotationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnnotationError::EmptyCommentText);
        }

        let comment = Comment::new(position, text, author, attribution);
        self.comments.push(comment.clone());
        Ok(comment)
    }

    /// [`AnnotationStore::try_add_comment`], returning `None` on rejection
    pub fn add_comment(
        &mut self,
        position: usize,
        text: &str,
        author: Option<String>,
        attribution: Attribution,
    ) -> Option<Comment> {
        self.try_add_comment(position, text, author, attribution)
            .map_err(|e| debug!("add_comment rejected: {e}"))
            .ok()
    }

    pub fn remove_comment(&mut self, id: &CommentId) -> bool {
        let before = self.comments.len();
        self.comments.retain(|comment| &comment.id != id);
        before != self.comments.len()
    }

    /// Mark a comment resolved; `false` if no such comment
    pub fn resolve_comment(&mut self, id: &CommentId) -> bool {
        match self.comments.iter_mut().find(|comment| &comment.id == id) {
            Some(comment) => {
                comment.resolved = true;
                true
            }
            None => false,
        }
    }

    /// Comments with `start <= position < end`, ordered by position
    pub fn comments_between(&self, start: usize, end: usize) -> Vec<&Comment> {
        let mut found: Vec<&Comment> = self
            .comments
            .iter()
            .filter(|comment| start <= comment.position && comment.position < end)
            .collect();
        found.sort_by_key(|comment| comment.position);
        found
    }

    pub fn unresolved_comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(|comment| !comment.resolved)
    }

    // Forward declarations for methods implemented in other modules

    /// Fold adjacent or overlapping ranges with identical kind, level and data.
    /// Returns how many ranges were folded away.
    pub fn merge_adjacent(&mut self) -> usize {
        crate::annotations::merge::merge_adjacent(self)
    }

    /// Drop or clamp everything that no longer fits a document of `document_len` characters
    pub fn cleanup(&mut self, document_len: usize) -> CleanupReport {
        crate::annotations::cleanup::cleanup(self, document_len)
    }

    /// Coarse fallback when no edit operations are known: bounds-check against the new text only
    pub fn reconcile_to_length(&mut self, new_text: &str) -> CleanupReport {
        crate::annotations::cleanup::reconcile_to_length(self, new_text)
    }

    /// Re-anchor every range and comment through a single edit
    pub fn apply_edit(&mut self, op: EditOp) {
        crate::annotations::adjust::apply_edit(self, op)
    }

    /// Apply a batch of edits given in pre-batch coordinates, then clean up
    pub fn apply_edit_batch(&mut self, ops: &[EditOp], new_document_len: usize) -> CleanupReport {
        crate::annotations::batch::apply_edit_batch(self, ops, new_document_len)
    }

    /// [`AnnotationStore::apply_edit_batch`] for raw editor notifications
    pub fn apply_notifications(
        &mut self,
        notifications: &[EditNotification],
        new_document_len: usize,
    ) -> CleanupReport {
        crate::annotations::batch::apply_notifications(self, notifications, new_document_len)
    }
}
