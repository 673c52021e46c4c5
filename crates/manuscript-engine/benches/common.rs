// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
use manuscript_engine::{AnnotationStore, Attribution, EditOp, RangeKind};

#[allow(dead_code)]
pub fn generate_manuscript(chapters: usize) -> String {
    let base = "Chapter\n\nIt was a bright cold day in April, and the clocks were striking thirteen. \
                The hallway smelt of boiled cabbage and old rag mats.\n\n";
    base.repeat(chapters)
}

/// One section heading per chapter plus a bold and an italic run and a comment
#[allow(dead_code)]
pub fn annotate(text: &str, chapters: usize) -> AnnotationStore {
    let chapter_len = text.chars().count() / chapters.max(1);
    let mut store = AnnotationStore::new();
    for chapter in 0..chapters {
        let base = chapter * chapter_len;
        store.add_range(base, base + 7, RangeKind::Section, 1, None, Attribution::default());
        store.add_range(base + 9, base + 20, RangeKind::Bold, 1, None, Attribution::default());
        store.add_range(base + 30, base + 45, RangeKind::Italic, 1, None, Attribution::default());
        store.add_comment(base + 50, "check pacing", None, Attribution::default());
    }
    store
}

/// Small scattered edits in pre-batch coordinates
#[allow(dead_code)]
pub fn scattered_edits(len: usize, count: usize) -> Vec<EditOp> {
    let step = (len / count.max(1)).max(1);
    (0..count)
        .map(|i| {
            if i % 2 == 0 {
                EditOp::insert(i * step, 3)
            } else {
                EditOp::delete(i * step, 2)
            }
        })
        .collect()
}
