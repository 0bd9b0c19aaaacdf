//! Renderer-agnostic document model.

use chrono::{DateTime, Utc};

use crate::extract::{ImageRef, QuizBlock};

/// An assembled report: ordered sections of ordered blocks.
///
/// Built once per request, handed to one renderer, then dropped.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl DocumentModel {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Total page-break hints across all sections.
    pub fn page_break_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.blocks)
            .filter(|b| matches!(b, Block::PageBreakHint))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Title,
    CourseStructure,
    Content,
    TechnicalSummary,
    RawContent,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub kind: SectionKind,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(kind: SectionKind, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn heading(&mut self, level: u8, text: impl Into<String>) {
        self.push(Block::Heading {
            level,
            text: text.into(),
        });
    }

    pub fn paragraph(&mut self, text: impl Into<String>) {
        self.push(Block::Paragraph(text.into()));
    }

    pub fn list_item(&mut self, indent: usize, text: impl Into<String>) {
        self.push(Block::ListItem {
            indent,
            text: text.into(),
        });
    }

    /// Content blocks, without page-break hints.
    pub fn content_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks
            .iter()
            .filter(|b| !matches!(b, Block::PageBreakHint))
    }
}

#[derive(Debug, Clone)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    /// An image; unresolved ones render as a caption placeholder.
    Image(ImageRef),
    ListItem { indent: usize, text: String },
    Quiz(QuizBlock),
    /// Verbatim text (raw file dumps), line structure preserved.
    Preformatted(String),
    /// Start a new page before the next block.
    PageBreakHint,
}
