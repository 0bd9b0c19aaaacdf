//! Plain-text renderer.

use std::fmt::Write as _;

use super::Renderer;
use crate::error::Result;
use crate::extract::QuizBlock;
use crate::report::{Block, DocumentModel};

/// Renders the document as UTF-8 text. Top-level headings are underlined,
/// deeper ones get `#` marks. Page-break hints are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_string(&self, doc: &DocumentModel) -> String {
        let mut out = String::new();
        for (i, section) in doc.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            for block in section.content_blocks() {
                write_block(&mut out, block);
            }
        }
        out
    }
}

impl Renderer for TextRenderer {
    fn render(&self, doc: &DocumentModel) -> Result<Vec<u8>> {
        Ok(self.render_string(doc).into_bytes())
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading { level: 0 | 1, text } => {
            let rule = "=".repeat(text.chars().count().max(3));
            let _ = writeln!(out, "{text}\n{rule}\n");
        }
        Block::Heading { level, text } => {
            let marks = "#".repeat((*level).min(6) as usize);
            let _ = writeln!(out, "{marks} {text}\n");
        }
        Block::Paragraph(text) => {
            let _ = writeln!(out, "{text}\n");
        }
        Block::ListItem { indent, text } => {
            let _ = writeln!(out, "{}- {text}", "  ".repeat(*indent));
        }
        Block::Image(image) => {
            let _ = writeln!(out, "[Image: {}]\n", image.caption);
        }
        Block::Quiz(quiz) => write_quiz(out, quiz),
        Block::Preformatted(text) => {
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        Block::PageBreakHint => {}
    }
}

fn write_quiz(out: &mut String, quiz: &QuizBlock) {
    let _ = writeln!(out, "### {}\n", quiz.title);
    for question in &quiz.questions {
        let _ = writeln!(out, "{}. {}", question.ordinal, question.text);
        for answer in &question.answers {
            let _ = writeln!(out, "   {}) {}", answer.label, answer.text);
        }
        out.push('\n');
    }
}
