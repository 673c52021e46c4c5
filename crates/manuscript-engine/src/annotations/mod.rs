/*!
 * # Annotation Offset Engine
 *
 * Formatting ranges and comments live beside the manuscript's plain text
 * rather than inside a rich document format. Everything here is about
 * keeping those character-offset anchors valid while the text is edited.
 *
 * ## Architecture Overview
 *
 * ### 1. One Store per Document
 * - An **`AnnotationStore`** holds the ranges and comments of exactly one document
 * - No process-wide state: every session or test creates its own store
 * - Ranges are always sorted by `(start, width)` so linear scans see a
 *   deterministic, nesting-friendly order
 *
 * ### 2. Same-Type Folding
 * - Adding a range folds in every overlapping (or touching) range of the same type
 * - `merge_adjacent` is an explicit maintenance pass for ranges that share
 *   kind, level and data; running it twice equals running it once
 *
 * ### 3. Edits Re-anchor Annotations
 * - An **`EditOp`** (position, inserted length, deleted length) is applied to
 *   every range and comment by the position adjuster
 * - Ranges anchored purely to deleted text are removed
 * - An edit batch is applied from the highest position down, then cleaned up
 *
 * ### 4. Cleanup Absorbs Drift
 * - Anything degenerate or outside the document is clamped or dropped
 * - Runs after bulk loads and after every edit batch
 *
 * ## Ordering Precondition
 *
 * No read may happen between a text change and the application of its edit
 * batch. The store cannot detect a violation; `ManuscriptSession` upholds it
 * by applying both in the same call.
 *
 * ## Module Structure
 *
 * - **`range`** / **`comment`** / **`attribution`**: the annotation types
 * - **`store`**: CRUD operations and point/range queries
 * - **`merge`**: same-kind folding pass
 * - **`cleanup`**: bounds validation against a document length
 * - **`adjust`**: single-edit position adjustment
 * - **`batch`**: edit-batch ordering and editor notifications
 */

pub mod adjust;
pub mod attribution;
pub mod batch;
pub mod cleanup;
pub mod comment;
pub mod merge;
pub mod range;
pub mod store;

pub use adjust::{EditOp, adjust_position, adjust_range};
pub use attribution::Attribution;
pub use batch::{EditKind, EditNotification};
pub use cleanup::CleanupReport;
pub use comment::{Comment, CommentId};
pub use range::{FormattingRange, RangeId, RangeKind};
pub use store::AnnotationStore;
