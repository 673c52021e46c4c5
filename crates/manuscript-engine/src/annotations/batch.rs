use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::annotations::{AnnotationStore, CleanupReport, EditOp, adjust, cleanup};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Insert,
    Delete,
    /// Content changed in place; offsets are unaffected
    Replace,
}

/// Change notification as reported by an editor surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditNotification {
    pub kind: EditKind,
    pub position: usize,
    pub length: usize,
}

impl EditNotification {
    pub fn insert(position: usize, length: usize) -> Self {
        Self {
            kind: EditKind::Insert,
            position,
            length,
        }
    }

    pub fn delete(position: usize, length: usize) -> Self {
        Self {
            kind: EditKind::Delete,
            position,
            length,
        }
    }

    /// The offset change this notification implies. In-place replacements
    /// and zero-length notifications move nothing.
    pub fn to_edit_op(&self) -> Option<EditOp> {
        if self.length == 0 {
            return None;
        }
        match self.kind {
            EditKind::Insert => Some(EditOp::insert(self.position, self.length)),
            EditKind::Delete => Some(EditOp::delete(self.position, self.length)),
            EditKind::Replace => None,
        }
    }
}

/// Apply every edit of one synchronisation pass, then clean up.
///
/// Positions are in pre-batch coordinates. Edits run from the highest
/// position down so an applied edit never shifts a position that a
/// remaining edit still refers to. At a shared position pure deletions
/// run before anything that inserts, so a replacement reported as a
/// delete plus an insert gives the same result in either order.
pub(crate) fn apply_edit_batch(
    store: &mut AnnotationStore,
    ops: &[EditOp],
    new_document_len: usize,
) -> CleanupReport {
    let mut ordered: Vec<EditOp> = ops.iter().copied().filter(|op| !op.is_noop()).collect();
    ordered.sort_by_key(|op| (Reverse(op.position), op.inserted_len > 0));

    debug!(
        "applying edit batch of {} op(s), new length {new_document_len}",
        ordered.len()
    );
    for op in ordered {
        adjust::apply_edit(store, op);
    }

    cleanup::cleanup(store, new_document_len)
}

pub(crate) fn apply_notifications(
    store: &mut AnnotationStore,
    notifications: &[EditNotification],
    new_document_len: usize,
) -> CleanupReport {
    let ops: Vec<EditOp> = notifications
        .iter()
        .filter_map(EditNotification::to_edit_op)
        .collect();
    apply_edit_batch(store, &ops, new_document_len)
}
