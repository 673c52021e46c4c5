//! Persisted annotation layout and file helpers.
//!
//! The on-disk shape is `{ ranges, comments, version }` with camelCase
//! fields. Loading is lenient: missing collections default to empty and
//! individual bad records are dropped instead of failing the whole file.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::annotations::{
    AnnotationStore, Attribution, Comment, CommentId, FormattingRange, RangeId, RangeKind,
};
use crate::error::AnnotationError;

pub const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid annotation JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_level() -> u32 {
    1
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

/// A formatting range as stored on disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub start: i64,
    pub end: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Link target, only when `data` is a non-object value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Image source, only when `data` is a non-object value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

impl From<&FormattingRange> for RangeRecord {
    fn from(range: &FormattingRange) -> Self {
        let mut record = Self {
            id: Some(range.id.to_string()),
            start: wire_offset(range.start),
            end: wire_offset(range.end),
            kind: range.kind.tag().to_string(),
            level: range.level,
            data: range.data.clone(),
            href: None,
            src: None,
            attribution: range.attribution.clone(),
        };

        match range.kind.data_with_payload(range.data.as_ref()) {
            Some(data) => record.data = data,
            None => match &range.kind {
                RangeKind::Link { href } => record.href = Some(href.clone()),
                RangeKind::Image { src } => record.src = Some(src.clone()),
                _ => {}
            },
        }
        record
    }
}

impl TryFrom<RangeRecord> for FormattingRange {
    type Error = AnnotationError;

    fn try_from(record: RangeRecord) -> Result<Self, Self::Error> {
        let start = offset(record.start)?;
        let end = offset(record.end)?;
        let mut data = record.data;
        let kind = match RangeKind::from_parts(&record.kind, &mut data) {
            Some(RangeKind::Link { href }) if href.is_empty() => RangeKind::Link {
                href: record.href.unwrap_or_default(),
            },
            Some(RangeKind::Image { src }) if src.is_empty() => RangeKind::Image {
                src: record.src.unwrap_or_default(),
            },
            Some(kind) => kind,
            None => return Err(AnnotationError::UnknownRangeType(record.kind)),
        };

        Ok(FormattingRange {
            id: record.id.map(RangeId::from).unwrap_or_else(RangeId::generate),
            start,
            end,
            kind,
            level: record.level.max(1),
            data,
            attribution: record.attribution,
        })
    }
}

/// A comment as stored on disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub position: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub attribution: Attribution,
}

impl From<&Comment> for CommentRecord {
    fn from(comment: &Comment) -> Self {
        Self {
            id: Some(comment.id.to_string()),
            position: wire_offset(comment.position),
            text: comment.text.clone(),
            resolved: comment.resolved,
            author: comment.author.clone(),
            attribution: comment.attribution.clone(),
        }
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = AnnotationError;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let position = offset(record.position)?;
        if record.text.trim().is_empty() {
            return Err(AnnotationError::EmptyCommentText);
        }
        Ok(Comment {
            id: record.id.map(CommentId::from).unwrap_or_else(CommentId::generate),
            position,
            text: record.text,
            resolved: record.resolved,
            author: record.author,
            attribution: record.attribution,
        })
    }
}

fn offset(value: i64) -> Result<usize, AnnotationError> {
    usize::try_from(value).map_err(|_| AnnotationError::NegativeOffset(value))
}

fn wire_offset(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Deserialize a record list element by element, dropping elements that
/// don't have the record's shape instead of failing the whole document
fn lenient_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            warn!("expected a list of records, found {other}; ignoring it");
            Vec::new()
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("dropping malformed record: {e}");
                None
            }
        })
        .collect())
}

/// Everything persisted for one document's annotations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(default, deserialize_with = "lenient_records")]
    pub ranges: Vec<RangeRecord>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub comments: Vec<CommentRecord>,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for AnnotationDocument {
    fn default() -> Self {
        Self {
            ranges: Vec::new(),
            comments: Vec::new(),
            version: default_version(),
        }
    }
}

impl From<&AnnotationStore> for AnnotationDocument {
    fn from(store: &AnnotationStore) -> Self {
        Self {
            ranges: store.ranges().iter().map(RangeRecord::from).collect(),
            comments: store.comments().iter().map(CommentRecord::from).collect(),
            version: default_version(),
        }
    }
}

impl AnnotationDocument {
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a validated store for a document of `document_len` characters.
    ///
    /// Records that can't be represented or repeat an earlier id are
    /// dropped with a warning; the result has been through cleanup.
    pub fn into_store(self, document_len: usize) -> AnnotationStore {
        if self.version != FORMAT_VERSION {
            warn!(
                "annotation format version {} differs from {FORMAT_VERSION}, loading anyway",
                self.version
            );
        }

        let mut store = AnnotationStore::new();

        let mut seen_ranges = HashSet::new();
        for record in self.ranges {
            match FormattingRange::try_from(record) {
                Ok(range) if !seen_ranges.insert(range.id.clone()) => {
                    warn!("dropping range with duplicate id {}", range.id);
                }
                Ok(range) => store.ranges.push(range),
                Err(e) => warn!("dropping range record: {e}"),
            }
        }

        let mut seen_comments = HashSet::new();
        for record in self.comments {
            match Comment::try_from(record) {
                Ok(comment) if !seen_comments.insert(comment.id.clone()) => {
                    warn!("dropping comment with duplicate id {}", comment.id);
                }
                Ok(comment) => store.comments.push(comment),
                Err(e) => warn!("dropping comment record: {e}"),
            }
        }

        store.cleanup(document_len);
        store
    }
}

/// Load and validate the annotation file at `path`
pub fn read_annotations(path: &Path, document_len: usize) -> Result<AnnotationStore, PersistenceError> {
    if !path.exists() {
        return Err(PersistenceError::NotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    Ok(AnnotationDocument::from_json(&json)?.into_store(document_len))
}

/// Write the store to `path`, creating parent directories
pub fn write_annotations(path: &Path, store: &AnnotationStore) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = AnnotationDocument::from(store).to_json()?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_missing_collections_default_to_empty() {
        let doc = AnnotationDocument::from_json("{}").unwrap();
        assert_eq!(doc, AnnotationDocument::default());
        assert!(doc.into_store(10).is_empty());
    }

    #[test]
    fn test_range_record_uses_persisted_field_names() {
        let mut store = AnnotationStore::new();
        let range = store
            .add_range(2, 9, RangeKind::link("https://example.com"), 1, None, Attribution::default())
            .unwrap();

        let value = serde_json::to_value(AnnotationDocument::from(&store)).unwrap();

        assert_eq!(
            value,
            json!({
                "ranges": [{
                    "id": range.id.as_str(),
                    "start": 2,
                    "end": 9,
                    "type": "link",
                    "level": 1,
                    "data": {"href": "https://example.com"}
                }],
                "comments": [],
                "version": "1.0"
            })
        );
    }

    #[test]
    fn test_untrusted_records_are_filtered() {
        let json = r#"{
            "ranges": [
                {"id": "r1", "start": 0, "end": 4, "type": "bold"},
                {"id": "r1", "start": 5, "end": 8, "type": "bold"},
                {"id": "r2", "start": -3, "end": 4, "type": "italic"},
                {"id": "r3", "start": 1, "end": 3, "type": "sparkle"},
                {"start": 2, "end": 50, "type": "heading", "level": 2},
                {"id": "r5", "start": 30, "end": 35, "type": "quote"}
            ],
            "comments": [
                {"id": "c1", "position": 3, "text": "keep"},
                {"id": "c2", "position": 4, "text": "   "},
                {"id": "c3", "position": 25, "text": "past the end"}
            ]
        }"#;

        let store = AnnotationDocument::from_json(json).unwrap().into_store(20);

        let ranges: Vec<_> = store
            .ranges()
            .iter()
            .map(|r| (r.start, r.end, r.kind.clone()))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (0, 4, RangeKind::Bold),
                (2, 20, RangeKind::Heading),
            ]
        );
        assert_eq!(store.ranges()[1].level, 2);
        assert_eq!(store.ranges()[0].id.as_str(), "r1");
        assert!(store.ranges()[1].id.as_str().starts_with("range-"));

        let comments: Vec<_> = store.comments().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(comments, vec!["c1"]);
    }

    #[test]
    fn test_attribution_roundtrips_through_json() {
        let json = r#"{
            "comments": [{
                "id": "c1",
                "position": 3,
                "text": "slow down",
                "resolved": true,
                "author": "Editor",
                "createdBy": "user-7",
                "createdAt": "2024-03-01T12:00:00Z"
            }],
            "version": "1.0"
        }"#;

        let doc = AnnotationDocument::from_json(json).unwrap();
        let store = doc.clone().into_store(10);
        let comment = &store.comments()[0];

        assert!(comment.resolved);
        assert_eq!(comment.attribution.created_by.as_deref(), Some("user-7"));
        assert_eq!(
            comment.attribution.created_at.map(|t| t.to_rfc3339()),
            Some("2024-03-01T12:00:00+00:00".to_string())
        );
        assert_eq!(AnnotationDocument::from(&store), doc);
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");

        let err = read_annotations(&missing, 10).unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(path) if path == missing));
    }

    #[test]
    fn test_read_rejects_malformed_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read_annotations(&path, 10), Err(PersistenceError::Json(_))));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_offsets_past_i64_saturate_when_written() {
        assert_eq!(wire_offset(42), 42);
        assert_eq!(wire_offset(usize::MAX), i64::MAX);
    }

    #[test]
    fn test_malformed_records_are_dropped_individually() {
        let json = r#"{
            "ranges": [
                {"id": "r1", "start": 0, "end": 4, "type": "bold"},
                {"id": "r2", "start": 0, "end": 4},
                {"id": "r3", "end": 4, "type": "italic"},
                {"id": "r4", "start": 1, "end": 3, "type": "section", "level": null},
                {"id": "r5", "start": 1, "end": 3, "type": "section", "level": -1},
                {"id": "r6", "start": 1.5, "end": 3, "type": "underline"},
                "not a record"
            ],
            "comments": [
                {"id": "c1", "position": 3, "text": "keep"},
                {"id": "c2", "text": "no position"}
            ]
        }"#;

        let store = AnnotationDocument::from_json(json).unwrap().into_store(20);

        let ids: Vec<_> = store.ranges().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1"]);
        let comments: Vec<_> = store.comments().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(comments, vec!["c1"]);
    }

    #[test]
    fn test_non_list_collection_loads_as_empty() {
        let doc = AnnotationDocument::from_json(r#"{"ranges": 3, "comments": null}"#).unwrap();
        assert_eq!(doc, AnnotationDocument::default());
    }

    #[test]
    fn test_level_survives_a_save_and_load() {
        let json = r#"{"ranges": [{"id": "r1", "start": 0, "end": 4, "type": "section", "level": 3}]}"#;

        let store = AnnotationDocument::from_json(json).unwrap().into_store(10);
        let saved = serde_json::to_value(AnnotationDocument::from(&store)).unwrap();

        assert_eq!(store.ranges()[0].level, 3);
        assert_eq!(saved["ranges"][0]["level"], json!(3));
    }

    #[rstest]
    #[case(RangeKind::link("https://example.com"), "href")]
    #[case(RangeKind::image("cover.png"), "src")]
    fn test_non_object_data_and_target_both_survive(#[case] kind: RangeKind, #[case] key: &str) {
        let mut store = AnnotationStore::new();
        store.add_range(0, 4, kind.clone(), 1, Some(json!("note")), Attribution::default());

        let doc = AnnotationDocument::from(&store);
        let saved = serde_json::to_value(&doc).unwrap();
        let restored = AnnotationDocument::from_json(&doc.to_json().unwrap())
            .unwrap()
            .into_store(10);

        assert_eq!(saved["ranges"][0]["data"], json!("note"));
        assert!(saved["ranges"][0].get(key).is_some());
        assert_eq!(restored.ranges()[0].kind, kind);
        assert_eq!(restored.ranges()[0].data, Some(json!("note")));
        assert_eq!(restored, store);
    }
}
