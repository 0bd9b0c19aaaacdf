//! Page geometry and block size estimates.
//!
//! The assembler and the PDF renderer share these numbers and the same
//! [`wrap_text`], so page-break hints line up with what actually gets drawn.

use serde::{Deserialize, Serialize};

use super::model::Block;
use crate::extract::{ImageRef, QuestionBlock};

/// Average Helvetica glyph width as a fraction of the font size.
const PROPORTIONAL_CHAR_WIDTH: f32 = 0.55;

/// Courier glyph width as a fraction of the font size.
const MONO_CHAR_WIDTH: f32 = 0.6;

/// Image pixels to points, assuming 96 dpi sources.
const PX_TO_PT: f32 = 0.75;

/// An image never starts with less room than this many text lines, which
/// keeps it above any paragraph reservation even as a placeholder.
const MIN_IMAGE_LINES: f32 = 3.0;

/// Page geometry in PDF points. Defaults to A4.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetrics {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub mono_font_size: f32,
    /// Space after paragraphs, headings, images and quizzes.
    pub block_gap: f32,
    /// Horizontal indent per list level.
    pub indent_width: f32,
}

impl Default for PageMetrics {
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 50.0,
            font_size: 10.0,
            line_height: 14.0,
            mono_font_size: 8.0,
            block_gap: 6.0,
            indent_width: 12.0,
        }
    }
}

impl PageMetrics {
    pub fn content_width(&self) -> f32 {
        (self.page_width - 2.0 * self.margin).max(1.0)
    }

    /// Usable height of one page.
    pub fn body_height(&self) -> f32 {
        (self.page_height - 2.0 * self.margin).max(1.0)
    }

    pub fn heading_font_size(&self, level: u8) -> f32 {
        match level {
            0 | 1 => self.font_size * 1.8,
            2 => self.font_size * 1.4,
            _ => self.font_size * 1.2,
        }
    }

    pub fn heading_line_height(&self, level: u8) -> f32 {
        self.heading_font_size(level) * 1.3
    }

    pub fn mono_line_height(&self) -> f32 {
        self.mono_font_size * 1.25
    }

    /// Characters of proportional text at `font_size` that fit in `width`.
    pub fn chars_for(&self, width: f32, font_size: f32) -> usize {
        ((width / (font_size * PROPORTIONAL_CHAR_WIDTH)) as usize).max(1)
    }

    pub fn chars_per_line(&self) -> usize {
        self.chars_for(self.content_width(), self.font_size)
    }

    pub fn mono_chars_per_line(&self) -> usize {
        ((self.content_width() / (self.mono_font_size * MONO_CHAR_WIDTH)) as usize).max(1)
    }

    pub fn indent_for(&self, level: usize) -> f32 {
        (level as f32 * self.indent_width).min(self.content_width() / 2.0)
    }

    /// Drawn size of an image, scaled down to fit the content width and to
    /// leave a caption line on an empty page. `None` draws a placeholder.
    pub fn image_box(&self, image: &ImageRef) -> Option<(f32, f32)> {
        image.bytes.as_ref()?;
        let (w, h) = image.pixel_size.filter(|&(w, h)| w > 0 && h > 0)?;
        let (w, h) = (w as f32 * PX_TO_PT, h as f32 * PX_TO_PT);
        let max_height = (self.body_height() - self.line_height - self.block_gap).max(self.line_height);
        let scale = (self.content_width() / w).min(max_height / h).min(1.0);
        Some((w * scale, h * scale))
    }

    /// Lines a heading occupies.
    pub fn heading_lines(&self, level: u8, text: &str) -> Vec<String> {
        wrap_text(text, self.chars_for(self.content_width(), self.heading_font_size(level)))
    }

    pub fn list_item_lines(&self, indent: usize, text: &str) -> Vec<String> {
        let width = self.content_width() - self.indent_for(indent) - self.indent_width;
        wrap_text(text, self.chars_for(width, self.font_size))
    }

    /// Estimated vertical space `block` takes when drawn.
    pub fn block_height(&self, block: &Block) -> f32 {
        match block {
            Block::Heading { level, text } => {
                self.heading_lines(*level, text).len() as f32 * self.heading_line_height(*level)
                    + self.block_gap
            }
            Block::Paragraph(text) => self.paragraph_height(text),
            Block::ListItem { indent, text } => {
                self.list_item_lines(*indent, text).len().max(1) as f32 * self.line_height
            }
            Block::Image(image) => self.image_height(image),
            Block::Quiz(quiz) => {
                let title = self.heading_lines(3, &quiz.title).len() as f32 * self.heading_line_height(3);
                title
                    + quiz
                        .questions
                        .iter()
                        .map(|q| self.question_height(q))
                        .sum::<f32>()
                    + self.block_gap
            }
            Block::Preformatted(text) => {
                wrap_preformatted(text, self.mono_chars_per_line()).len() as f32 * self.mono_line_height()
                    + self.block_gap
            }
            Block::PageBreakHint => 0.0,
        }
    }

    /// Space that must be free on the current page before `block` may start
    /// there. Headings keep two lines of what follows; images keep their
    /// caption and at least three lines of room; a quiz keeps its
    /// title with its first question.
    pub fn reservation(&self, block: &Block) -> f32 {
        let reserved = match block {
            Block::Heading { .. } => self.block_height(block) + 2.0 * self.line_height,
            Block::Paragraph(_) | Block::Preformatted(_) => {
                self.block_height(block).min(2.0 * self.line_height)
            }
            Block::ListItem { .. } => self.line_height,
            Block::Image(image) => self
                .image_height(image)
                .max(MIN_IMAGE_LINES * self.line_height),
            Block::Quiz(quiz) => {
                self.heading_lines(3, &quiz.title).len() as f32 * self.heading_line_height(3)
                    + quiz.questions.first().map(|q| self.question_height(q)).unwrap_or(0.0)
            }
            Block::PageBreakHint => 0.0,
        };
        reserved.min(self.body_height())
    }

    fn paragraph_height(&self, text: &str) -> f32 {
        wrap_text(text, self.chars_per_line()).len() as f32 * self.line_height + self.block_gap
    }

    /// Image plus caption line.
    fn image_height(&self, image: &ImageRef) -> f32 {
        let picture = self.image_box(image).map(|(_, h)| h).unwrap_or(0.0);
        picture + self.line_height + self.block_gap
    }

    fn question_height(&self, question: &QuestionBlock) -> f32 {
        let text = format!("{}. {}", question.ordinal, question.text);
        let mut lines = wrap_text(&text, self.chars_per_line()).len();
        for answer in &question.answers {
            lines += self.list_item_lines(1, &format!("{}) {}", answer.label, answer.text)).len();
        }
        lines as f32 * self.line_height + self.block_gap
    }
}

/// Greedy word wrap to at most `max_chars` characters per line. Words
/// longer than a line are split. Whitespace-only text has no lines.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if line_len == 0 { word.len() } else { line_len + 1 + word.len() };
        if needed > max_chars && line_len > 0 {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            line.push(' ');
            line_len += 1;
        }
        line.extend(word.iter());
        line_len += word.len();
    }

    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// Hard-wrap verbatim text, keeping its line breaks. Tabs become four
/// spaces; trailing whitespace is dropped.
pub fn wrap_preformatted(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for raw in text.lines() {
        let expanded: Vec<char> = raw.replace('\t', "    ").trim_end().chars().collect();
        if expanded.is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(expanded.chunks(max_chars).map(|chunk| chunk.iter().collect::<String>()));
    }
    lines
}
