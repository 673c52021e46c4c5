use log::debug;
use std::ops::Range;
use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::annotations::{AnnotationStore, CleanupReport, EditNotification, EditOp};
use crate::error::AnnotationError;
use crate::io::AnnotationDocument;
use crate::text::{char_len, rope_char_len, rope_char_to_byte};
use crate::toc::{TocEntry, TocOptions, extract_headings};

/// Text edits in character offsets
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText { at: usize, text: String },
    DeleteRange { range: Range<usize> },
    ReplaceRange { range: Range<usize>, text: String },
}

impl Cmd {
    fn to_edit_op(&self, len: usize) -> Result<EditOp, AnnotationError> {
        let (range, text) = match self {
            Cmd::InsertText { at, text } => (*at..*at, text.as_str()),
            Cmd::DeleteRange { range } => (range.clone(), ""),
            Cmd::ReplaceRange { range, text } => (range.clone(), text.as_str()),
        };

        if range.start > range.end || range.end > len {
            return Err(AnnotationError::EditOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }

        let op = EditOp::replace(range.start, range.len(), char_len(text));
        if op.is_noop() {
            return Err(AnnotationError::EmptyEdit);
        }
        Ok(op)
    }
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub edit: EditOp,
    pub cleanup: CleanupReport,
    pub version: u64,
}

/// One open manuscript: the text buffer and the annotations anchored to it.
///
/// Every text change goes through [`ManuscriptSession::apply`], which
/// re-anchors the annotations before returning, so no read can observe
/// text and annotations out of step.
#[derive(Clone)]
pub struct ManuscriptSession {
    buffer: Rope,
    annotations: AnnotationStore,
    len_chars: usize,
    version: u64,
}

impl ManuscriptSession {
    pub fn new(text: &str) -> Self {
        Self {
            buffer: Rope::from(text),
            annotations: AnnotationStore::new(),
            len_chars: char_len(text),
            version: 0,
        }
    }

    /// Open a manuscript with previously persisted annotations
    pub fn from_document(text: &str, document: AnnotationDocument) -> Self {
        let len_chars = char_len(text);
        Self {
            buffer: Rope::from(text),
            annotations: document.into_store(len_chars),
            len_chars,
            version: 0,
        }
    }

    /// Open a manuscript with an already validated store
    pub fn with_store(text: &str, mut annotations: AnnotationStore) -> Self {
        let len_chars = char_len(text);
        annotations.cleanup(len_chars);
        Self {
            buffer: Rope::from(text),
            annotations,
            len_chars,
            version: 0,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.len_chars
    }

    pub fn is_empty(&self) -> bool {
        self.len_chars == 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    /// Formatting and comment CRUD; text edits must go through [`ManuscriptSession::apply`]
    pub fn annotations_mut(&mut self) -> &mut AnnotationStore {
        &mut self.annotations
    }

    /// Text of a character range, clamped to the document
    pub fn slice(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.len_chars);
        let start = range.start.min(end);
        match (
            rope_char_to_byte(&self.buffer, start),
            rope_char_to_byte(&self.buffer, end),
        ) {
            (Some(start), Some(end)) => self.buffer.slice_to_cow(start..end).into_owned(),
            _ => String::new(),
        }
    }

    /// Apply a text edit and re-anchor annotations.
    ///
    /// Returns `None` without touching anything when the command is out of
    /// bounds or changes nothing.
    pub fn apply(&mut self, cmd: Cmd) -> Option<Patch> {
        self.try_apply(cmd)
            .map_err(|e| debug!("command rejected: {e}"))
            .ok()
    }

    pub fn try_apply(&mut self, cmd: Cmd) -> Result<Patch, AnnotationError> {
        let edit = cmd.to_edit_op(self.len_chars)?;
        let delta = self.compile(&cmd, edit)?;

        self.buffer = delta.apply(&self.buffer);
        self.len_chars = self.len_chars - edit.deleted_len + edit.inserted_len;

        let cleanup = self.annotations.apply_edit_batch(&[edit], self.len_chars);
        self.version += 1;

        Ok(Patch {
            edit,
            cleanup,
            version: self.version,
        })
    }

    fn compile(&self, cmd: &Cmd, edit: EditOp) -> Result<Delta<RopeInfo>, AnnotationError> {
        let out_of_bounds = || AnnotationError::EditOutOfBounds {
            start: edit.position,
            end: edit.deleted_end(),
            len: self.len_chars,
        };
        let start = rope_char_to_byte(&self.buffer, edit.position).ok_or_else(out_of_bounds)?;
        let end = rope_char_to_byte(&self.buffer, edit.deleted_end()).ok_or_else(out_of_bounds)?;

        let mut builder = Builder::new(self.buffer.len());
        match cmd {
            Cmd::DeleteRange { .. } => builder.delete(start..end),
            Cmd::InsertText { text, .. } | Cmd::ReplaceRange { text, .. } => {
                builder.replace(start..end, Rope::from(text.as_str()))
            }
        }
        Ok(builder.build())
    }

    /// Take over text that an external surface already changed, given the
    /// notifications it reported for the change
    pub fn apply_notifications(
        &mut self,
        notifications: &[EditNotification],
        new_text: &str,
    ) -> CleanupReport {
        self.replace_buffer(new_text);
        let report = self
            .annotations
            .apply_notifications(notifications, self.len_chars);
        self.version += 1;
        report
    }

    /// Fallback when no edit information is available: only bounds-check
    pub fn reconcile(&mut self, new_text: &str) -> CleanupReport {
        self.replace_buffer(new_text);
        let report = self.annotations.cleanup(self.len_chars);
        self.version += 1;
        report
    }

    fn replace_buffer(&mut self, new_text: &str) {
        self.buffer = Rope::from(new_text);
        self.len_chars = rope_char_len(&self.buffer);
    }

    pub fn headings(&self, options: &TocOptions) -> Vec<TocEntry> {
        extract_headings(&self.annotations, &self.text(), options)
    }

    pub fn to_document(&self) -> AnnotationDocument {
        AnnotationDocument::from(&self.annotations)
    }
}
