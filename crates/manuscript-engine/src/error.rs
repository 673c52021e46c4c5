use thiserror::Error;

/// Why a mutating call on the annotation store was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("invalid range bounds {start}..{end}: start must be before end")]
    InvalidBounds { start: usize, end: usize },
    #[error("negative offset {0}")]
    NegativeOffset(i64),
    #[error("comment text is empty")]
    EmptyCommentText,
    #[error("unknown range type: {0}")]
    UnknownRangeType(String),
    #[error("edit changes nothing")]
    EmptyEdit,
    #[error("edit {start}..{end} is outside the document (length {len})")]
    EditOutOfBounds { start: usize, end: usize, len: usize },
}
