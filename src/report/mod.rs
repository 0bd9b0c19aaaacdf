//! Report assembly.
//!
//! [`ReportAssembler`] turns a [`CourseManifest`](crate::manifest::CourseManifest)
//! and the page extractions into a [`DocumentModel`]: a title section, the
//! course structure, one content section per page, a technical summary and
//! optionally the raw text of every file. Each section is then paginated
//! with a [`PageCursor`] so page-break decisions are made here, not by the
//! renderer.

mod assemble;
mod layout;
mod model;
mod paginate;

pub use assemble::ReportAssembler;
pub use layout::{PageMetrics, wrap_preformatted, wrap_text};
pub use model::{Block, DocumentModel, Section, SectionKind};
pub use paginate::{PageCursor, paginate};

use std::borrow::Cow;

/// Marker appended to truncated raw content.
pub const TRUNCATION_MARKER: &str = "[content truncated]";

/// Cut `text` to `limit` characters followed by a newline and
/// [`TRUNCATION_MARKER`]. Text within the limit is returned unchanged.
pub fn truncate_content(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}\n{TRUNCATION_MARKER}", &text[..cut])),
    }
}
