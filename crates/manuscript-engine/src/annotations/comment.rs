use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::annotations::Attribution;

/// Opaque identifier of a comment
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub fn generate() -> Self {
        Self(format!("comment-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CommentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point annotation anchored before the character at `position`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub position: usize,
    pub text: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

impl Comment {
    pub fn new(
        position: usize,
        text: impl Into<String>,
        author: Option<String>,
        attribution: Attribution,
    ) -> Self {
        Self {
            id: CommentId::generate(),
            position,
            text: text.into(),
            resolved: false,
            author,
            attribution,
        }
    }
}
