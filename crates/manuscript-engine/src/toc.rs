//! Table of contents derived from heading-type ranges.
//!
//! Recomputed on demand from the store and the live text; nothing is cached.

use serde::Serialize;

use crate::annotations::{AnnotationStore, RangeId, RangeKind};
use crate::text::slice_chars;

pub const DEFAULT_MAX_SNIPPET_CHARS: usize = 100;
pub const DEFAULT_PLACEHOLDER: &str = "Untitled";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocOptions {
    /// Snippets are cut to this many characters
    pub max_snippet_chars: usize,
    /// Shown when a heading's text is empty or out of bounds
    pub placeholder: String,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            max_snippet_chars: DEFAULT_MAX_SNIPPET_CHARS,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingKind {
    Title,
    Subtitle,
    Section,
    Subsection,
}

impl HeadingKind {
    pub fn from_range_kind(kind: &RangeKind) -> Option<Self> {
        match kind {
            RangeKind::Title => Some(HeadingKind::Title),
            RangeKind::Subtitle => Some(HeadingKind::Subtitle),
            RangeKind::Section => Some(HeadingKind::Section),
            RangeKind::Subsection => Some(HeadingKind::Subsection),
            _ => None,
        }
    }

    /// Fixed outline depth
    pub fn level(self) -> u8 {
        match self {
            HeadingKind::Title => 1,
            HeadingKind::Subtitle => 2,
            HeadingKind::Section => 3,
            HeadingKind::Subsection => 4,
        }
    }
}

/// One heading in the flat outline; nesting is implied by `level`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub id: RangeId,
    #[serde(rename = "type")]
    pub kind: HeadingKind,
    pub level: u8,
    pub text: String,
    pub position: usize,
    pub end_position: usize,
}

/// Headings of `store`, resolved against `text` and ordered by position
pub fn extract_headings(store: &AnnotationStore, text: &str, options: &TocOptions) -> Vec<TocEntry> {
    let mut entries: Vec<TocEntry> = store
        .ranges()
        .iter()
        .filter_map(|range| {
            let kind = HeadingKind::from_range_kind(&range.kind)?;
            Some(TocEntry {
                id: range.id.clone(),
                kind,
                level: kind.level(),
                text: heading_snippet(text, range.start, range.end, options),
                position: range.start,
                end_position: range.end,
            })
        })
        .collect();

    entries.sort_by_key(|entry| entry.position);
    entries
}

/// Display text for `start..end`: whitespace collapsed, trimmed and cut to length
pub fn heading_snippet(text: &str, start: usize, end: usize, options: &TocOptions) -> String {
    let collapsed = slice_chars(text, start, end)
        .map(|slice| slice.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let snippet: String = collapsed.chars().take(options.max_snippet_chars).collect();
    let snippet = snippet.trim_end();
    if snippet.is_empty() {
        options.placeholder.clone()
    } else {
        snippet.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Attribution;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn outline(entries: &[TocEntry]) -> String {
        entries
            .iter()
            .map(|e| {
                let indent = "  ".repeat(usize::from(e.level - 1));
                format!("{indent}{} [{}..{}]", e.text, e.position, e.end_position)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_title_and_section_in_order() {
        let text = "Intro and then more text, Part One of it all";
        let mut store = AnnotationStore::new();
        store.add_range(20, 28, RangeKind::Section, 1, None, Attribution::default());
        store.add_range(0, 5, RangeKind::Title, 1, None, Attribution::default());
        store.add_range(0, 10, RangeKind::Bold, 1, None, Attribution::default());

        let toc = extract_headings(&store, text, &TocOptions::default());

        assert_eq!(toc.len(), 2);
        assert_eq!((toc[0].kind, toc[0].level), (HeadingKind::Title, 1));
        assert_eq!((toc[1].kind, toc[1].level), (HeadingKind::Section, 3));
        assert_eq!(toc[0].text, "Intro");
    }

    #[test]
    fn test_outline_of_manuscript() {
        let text = "The Long Road\nA Novel\n\nChapter 1\n  The   Start\nIt began.\nChapter 2\nEnd.";
        let mut store = AnnotationStore::new();
        store.add_range(0, 13, RangeKind::Title, 1, None, Attribution::default());
        store.add_range(14, 21, RangeKind::Subtitle, 1, None, Attribution::default());
        store.add_range(23, 32, RangeKind::Section, 1, None, Attribution::default());
        store.add_range(33, 46, RangeKind::Subsection, 1, None, Attribution::default());
        store.add_range(57, 66, RangeKind::Section, 1, None, Attribution::default());
        store.add_range(47, 56, RangeKind::Italic, 1, None, Attribution::default());

        let toc = extract_headings(&store, text, &TocOptions::default());

        assert_snapshot!(outline(&toc), @r"
        The Long Road [0..13]
          A Novel [14..21]
            Chapter 1 [23..32]
              The Start [33..46]
            Chapter 2 [57..66]
        ");
    }

    #[rstest]
    #[case("  Chapter\n\n\tOne  ", "Chapter One")]
    #[case("   \n ", "Untitled")]
    fn test_snippet_whitespace(#[case] text: &str, #[case] expected: &str) {
        let options = TocOptions::default();
        assert_eq!(heading_snippet(text, 0, text.chars().count(), &options), expected);
    }

    #[test]
    fn test_snippet_out_of_bounds_uses_placeholder() {
        let options = TocOptions {
            max_snippet_chars: 100,
            placeholder: "(no text)".to_string(),
        };
        assert_eq!(heading_snippet("short", 10, 20, &options), "(no text)");
        assert_eq!(heading_snippet("short", 2, 20, &options), "ort");
    }

    #[test]
    fn test_snippet_is_truncated_by_characters() {
        let text = "é".repeat(150);
        let snippet = heading_snippet(&text, 0, 150, &TocOptions::default());
        assert_eq!(snippet.chars().count(), DEFAULT_MAX_SNIPPET_CHARS);
    }
}
