use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::mem;
use uuid::Uuid;

use crate::annotations::Attribution;

/// Opaque identifier of a formatting range, stable for the range's lifetime
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeId(String);

impl RangeId {
    pub fn generate() -> Self {
        Self(format!("range-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RangeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RangeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a range formats
///
/// Link and image targets are carried by their variant; anything else
/// attached to a range travels in [`FormattingRange::data`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RangeKind {
    Bold,
    Italic,
    Underline,
    Quote,
    Title,
    Subtitle,
    Section,
    Subsection,
    Link { href: String },
    Image { src: String },
    List,
    ListItem,
    Table,
    Paragraph,
    Heading,
}

impl RangeKind {
    pub fn link(href: impl Into<String>) -> Self {
        RangeKind::Link { href: href.into() }
    }

    pub fn image(src: impl Into<String>) -> Self {
        RangeKind::Image { src: src.into() }
    }

    /// The persisted `type` tag
    pub fn tag(&self) -> &'static str {
        match self {
            RangeKind::Bold => "bold",
            RangeKind::Italic => "italic",
            RangeKind::Underline => "underline",
            RangeKind::Quote => "quote",
            RangeKind::Title => "title",
            RangeKind::Subtitle => "subtitle",
            RangeKind::Section => "section",
            RangeKind::Subsection => "subsection",
            RangeKind::Link { .. } => "link",
            RangeKind::Image { .. } => "image",
            RangeKind::List => "list",
            RangeKind::ListItem => "list-item",
            RangeKind::Table => "table",
            RangeKind::Paragraph => "paragraph",
            RangeKind::Heading => "heading",
        }
    }

    /// Same variant, ignoring payload (a link is the same type as any other link)
    pub fn same_type(&self, other: &RangeKind) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Rebuild a kind from its persisted parts.
    ///
    /// For links and images the target is moved out of `data`; if that
    /// leaves `data` an empty object it becomes `None`.
    pub fn from_parts(tag: &str, data: &mut Option<Value>) -> Option<Self> {
        let kind = match tag {
            "bold" => RangeKind::Bold,
            "italic" => RangeKind::Italic,
            "underline" => RangeKind::Underline,
            "quote" => RangeKind::Quote,
            "title" => RangeKind::Title,
            "subtitle" => RangeKind::Subtitle,
            "section" => RangeKind::Section,
            "subsection" => RangeKind::Subsection,
            "link" => RangeKind::Link {
                href: take_string_field(data, "href"),
            },
            "image" => RangeKind::Image {
                src: take_string_field(data, "src"),
            },
            "list" => RangeKind::List,
            "list-item" => RangeKind::ListItem,
            "table" => RangeKind::Table,
            "paragraph" => RangeKind::Paragraph,
            "heading" => RangeKind::Heading,
            _ => return None,
        };
        Some(kind)
    }

    /// Link or image target, with the key it is persisted under
    pub fn payload(&self) -> Option<(&'static str, &str)> {
        match self {
            RangeKind::Link { href } if !href.is_empty() => Some(("href", href.as_str())),
            RangeKind::Image { src } if !src.is_empty() => Some(("src", src.as_str())),
            _ => None,
        }
    }

    /// Inverse of [`RangeKind::from_parts`]: fold the variant payload back into `data`.
    ///
    /// Returns `None` when there is a payload but `data` is a non-object
    /// value it can't be merged into.
    pub fn data_with_payload(&self, data: Option<&Value>) -> Option<Option<Value>> {
        let Some((key, value)) = self.payload() else {
            return Some(data.cloned());
        };

        let mut object = match data {
            None => serde_json::Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return None,
        };
        object.insert(key.to_string(), Value::String(value.to_string()));
        Some(Some(Value::Object(object)))
    }
}

fn take_string_field(data: &mut Option<Value>, key: &str) -> String {
    let Some(Value::Object(map)) = data.as_mut() else {
        return String::new();
    };
    let taken = match map.get(key) {
        Some(Value::String(_)) => map.remove(key),
        _ => None,
    };
    if taken.is_some() && map.is_empty() {
        *data = None;
    }
    match taken {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A formatting annotation over the half-open character interval `start..end`
#[derive(Clone, Debug, PartialEq)]
pub struct FormattingRange {
    pub id: RangeId,
    pub start: usize,
    pub end: usize,
    pub kind: RangeKind,
    /// Nesting level for heading-like kinds, at least 1
    pub level: u32,
    /// Opaque passthrough payload, never interpreted by the engine
    pub data: Option<Value>,
    pub attribution: Attribution,
}

impl FormattingRange {
    pub fn new(
        start: usize,
        end: usize,
        kind: RangeKind,
        data: Option<Value>,
        attribution: Attribution,
    ) -> Self {
        Self {
            id: RangeId::generate(),
            start,
            end,
            kind,
            level: 1,
            data,
            attribution,
        }
    }

    /// Set the level, raised to 1 if zero
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Number of characters covered
    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Caret-style containment, inclusive of both boundaries
    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    /// Overlap test where touching at an endpoint counts
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        !(self.end < start || self.start > end)
    }

    /// Same kind (payload included), level and passthrough data
    pub fn mergeable_with(&self, other: &FormattingRange) -> bool {
        self.kind == other.kind && self.level == other.level && self.data == other.data
    }
}

/// Stable sort by start, shorter range first on ties
pub(crate) fn sort_ranges(ranges: &mut [FormattingRange]) {
    ranges.sort_by_key(|range| (range.start, range.width()));
}
