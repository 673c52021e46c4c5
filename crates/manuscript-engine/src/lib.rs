pub mod annotations;
pub mod error;
pub mod io;
pub mod session;
pub mod text;
pub mod toc;

// Re-export key types for easier usage
pub use annotations::*;
pub use error::AnnotationError;
pub use io::{AnnotationDocument, PersistenceError, read_annotations, write_annotations};
pub use session::{Cmd, ManuscriptSession, Patch};
pub use toc::{HeadingKind, TocEntry, TocOptions, extract_headings};
