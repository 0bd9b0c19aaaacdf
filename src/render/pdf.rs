//! PDF renderer built on `lopdf`.
//!
//! Text uses the standard Type 1 fonts with WinAnsi encoding, so no font
//! files are embedded. Images are decoded with the `image` crate and
//! written as Flate-compressed RGB XObjects; anything that fails to decode
//! is drawn as a `[Image: caption]` placeholder instead.
//!
//! Every section starts on a new page. Page-break hints from the assembler
//! force a new page, and text that overflows the bottom margin continues on
//! the next one.

use std::collections::HashMap;
use std::io::Write;

use encoding_rs::WINDOWS_1252;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use tracing::{debug, warn};

use super::Renderer;
use crate::error::{Error, Result};
use crate::extract::{ImageRef, QuizBlock};
use crate::report::{Block, DocumentModel, PageMetrics, wrap_preformatted, wrap_text};

/// Larger images are downscaled before embedding.
const MAX_IMAGE_PIXELS: u32 = 1600;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
    Oblique,
    Mono,
}

impl Font {
    const ALL: [Font; 4] = [Font::Regular, Font::Bold, Font::Oblique, Font::Mono];

    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
            Font::Mono => "F4",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
            Font::Mono => "Courier",
        }
    }
}

/// Renders a [`DocumentModel`] to PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    metrics: PageMetrics,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: PageMetrics) -> Self {
        Self { metrics }
    }
}

impl Renderer for PdfRenderer {
    fn render(&self, doc: &DocumentModel) -> Result<Vec<u8>> {
        let mut canvas = Canvas::new(self.metrics);
        for section in &doc.sections {
            canvas.start_section();
            for block in &section.blocks {
                canvas.block(block);
            }
        }
        let bytes = canvas.finish(doc)?;
        debug!(bytes = bytes.len(), "rendered PDF");
        Ok(bytes)
    }
}

/// Drawing state: finished pages, the page being drawn and the pen height.
struct Canvas {
    metrics: PageMetrics,
    doc: Document,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    /// Top of the next line, in PDF coordinates.
    y: f32,
    started: bool,
    /// XObject name per resolved image path; `None` when decoding failed.
    images: HashMap<String, Option<String>>,
    xobjects: Dictionary,
}

impl Canvas {
    fn new(metrics: PageMetrics) -> Self {
        Self {
            metrics,
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
            ops: Vec::new(),
            y: metrics.page_height - metrics.margin,
            started: false,
            images: HashMap::new(),
            xobjects: Dictionary::new(),
        }
    }

    fn top(&self) -> f32 {
        self.metrics.page_height - self.metrics.margin
    }

    fn at_page_top(&self) -> bool {
        self.y >= self.top()
    }

    fn new_page(&mut self) {
        if self.started {
            self.pages.push(std::mem::take(&mut self.ops));
        }
        self.started = true;
        self.y = self.top();
    }

    fn start_section(&mut self) {
        if !self.started || !self.at_page_top() {
            self.new_page();
        }
    }

    /// Break unless `height` still fits above the bottom margin.
    fn ensure(&mut self, height: f32) {
        if !self.started {
            self.new_page();
        } else if self.y - height < self.metrics.margin && !self.at_page_top() {
            self.new_page();
        }
    }

    fn gap(&mut self) {
        self.y -= self.metrics.block_gap;
    }

    /// Reserve one line of `leading` and return its baseline.
    fn next_baseline(&mut self, leading: f32, size: f32) -> f32 {
        self.ensure(leading);
        let baseline = self.y - (leading + size * 0.6) / 2.0;
        self.y -= leading;
        baseline
    }

    fn draw_text(&mut self, font: Font, size: f32, x: f32, baseline: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn line(&mut self, font: Font, size: f32, leading: f32, indent: f32, text: &str) {
        let baseline = self.next_baseline(leading, size);
        let x = self.metrics.margin + indent;
        self.draw_text(font, size, x, baseline, text);
    }

    fn block(&mut self, block: &Block) {
        if let Block::PageBreakHint = block {
            if self.started && !self.at_page_top() {
                self.new_page();
            }
            return;
        }
        self.ensure(self.metrics.reservation(block));

        let m = self.metrics;
        match block {
            Block::Heading { level, text } => {
                self.heading(*level, text);
                self.gap();
            }
            Block::Paragraph(text) => {
                for line in wrap_text(text, m.chars_per_line()) {
                    self.line(Font::Regular, m.font_size, m.line_height, 0.0, &line);
                }
                self.gap();
            }
            Block::ListItem { indent, text } => self.list_item(*indent, text),
            Block::Image(image) => {
                self.image(image);
                self.gap();
            }
            Block::Quiz(quiz) => {
                self.quiz(quiz);
                self.gap();
            }
            Block::Preformatted(text) => {
                for line in wrap_preformatted(text, m.mono_chars_per_line()) {
                    self.line(Font::Mono, m.mono_font_size, m.mono_line_height(), 0.0, &line);
                }
                self.gap();
            }
            Block::PageBreakHint => {}
        }
    }

    fn heading(&mut self, level: u8, text: &str) {
        let size = self.metrics.heading_font_size(level);
        let leading = self.metrics.heading_line_height(level);
        for line in self.metrics.heading_lines(level, text) {
            self.line(Font::Bold, size, leading, 0.0, &line);
        }
    }

    fn list_item(&mut self, indent: usize, text: &str) {
        let m = self.metrics;
        let x = m.margin + m.indent_for(indent);
        for (i, line) in m.list_item_lines(indent, text).iter().enumerate() {
            let baseline = self.next_baseline(m.line_height, m.font_size);
            if i == 0 {
                self.draw_text(Font::Regular, m.font_size, x, baseline, "\u{2022}");
            }
            self.draw_text(Font::Regular, m.font_size, x + m.indent_width, baseline, line);
        }
    }

    fn quiz(&mut self, quiz: &QuizBlock) {
        let m = self.metrics;
        self.heading(3, &quiz.title);
        for question in &quiz.questions {
            let text = format!("{}. {}", question.ordinal, question.text);
            for line in wrap_text(&text, m.chars_per_line()) {
                self.line(Font::Bold, m.font_size, m.line_height, 0.0, &line);
            }
            for answer in &question.answers {
                let text = format!("{}) {}", answer.label, answer.text);
                for line in m.list_item_lines(1, &text) {
                    self.line(
                        Font::Regular,
                        m.font_size,
                        m.line_height,
                        m.indent_for(1) + m.indent_width,
                        &line,
                    );
                }
            }
            self.gap();
        }
    }

    fn image(&mut self, image: &ImageRef) {
        let m = self.metrics;
        let placed = m
            .image_box(image)
            .and_then(|size| self.xobject_for(image).map(|name| (name, size)));

        let Some((name, (width, height))) = placed else {
            let caption = format!("[Image: {}]", image.caption);
            self.line(Font::Oblique, m.font_size, m.line_height, 0.0, &caption);
            return;
        };

        self.ensure(height + m.line_height);
        let x = m.margin + (m.content_width() - width) / 2.0;
        let bottom = self.y - height;
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    Object::Integer(0),
                    Object::Integer(0),
                    height.into(),
                    x.into(),
                    bottom.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        self.y = bottom;
        self.line(Font::Oblique, m.font_size, m.line_height, 0.0, &image.caption);
    }

    /// Embed `image` once per resolved path and return its resource name.
    fn xobject_for(&mut self, image: &ImageRef) -> Option<String> {
        let bytes = image.bytes.as_ref()?;
        let key = image.resolved_path.clone().unwrap_or_else(|| image.source.clone());
        if let Some(slot) = self.images.get(&key) {
            return slot.clone();
        }

        let slot = match encode_image(bytes) {
            Ok(stream) => {
                let id = self.doc.add_object(stream);
                let name = format!("Im{}", self.images.len() + 1);
                self.xobjects.set(name.as_bytes(), Object::Reference(id));
                Some(name)
            }
            Err(err) => {
                warn!(path = %key, error = %err, "cannot decode image, drawing placeholder");
                None
            }
        };
        self.images.insert(key, slot.clone());
        slot
    }

    fn finish(mut self, model: &DocumentModel) -> Result<Vec<u8>> {
        if self.started {
            self.pages.push(std::mem::take(&mut self.ops));
        }
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }

        let m = self.metrics;
        let total = self.pages.len();
        let pages_id = self.doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in Font::ALL {
            let id = self.doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource(), Object::Reference(id));
        }
        let resources_id = self.doc.add_object(dictionary! {
            "Font" => fonts,
            "XObject" => std::mem::take(&mut self.xobjects),
        });

        let mut kids: Vec<Object> = Vec::with_capacity(total);
        for (index, mut operations) in std::mem::take(&mut self.pages).into_iter().enumerate() {
            let footer = format!("Page {} of {total}", index + 1);
            let size = m.font_size * 0.8;
            let width = footer.chars().count() as f32 * size * 0.55;
            let x = (m.page_width - width) / 2.0;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Font::Regular.resource().into(), size.into()]),
                Operation::new("Td", vec![x.into(), (m.margin / 2.0).into()]),
                Operation::new("Tj", vec![Object::string_literal(footer)]),
                Operation::new("ET", vec![]),
            ]);

            let content = Content { operations }
                .encode()
                .map_err(|e| Error::Render(e.to_string()))?;
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(total as i64),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                m.page_width.into(),
                m.page_height.into(),
            ],
        };
        self.doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(&model.title)),
            "Producer" => Object::string_literal(concat!("scorm-report ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(
                model.generated_at.format("D:%Y%m%d%H%M%SZ").to_string(),
            ),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| Error::Render(e.to_string()))?;
        Ok(out)
    }
}

/// Decode, flatten onto white and Flate-compress an image as an RGB XObject.
fn encode_image(bytes: &[u8]) -> std::result::Result<Stream, String> {
    let mut decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    if decoded.width() > MAX_IMAGE_PIXELS || decoded.height() > MAX_IMAGE_PIXELS {
        decoded = decoded.thumbnail(MAX_IMAGE_PIXELS, MAX_IMAGE_PIXELS);
    }
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u32::from(a);
        for channel in [r, g, b] {
            rgb.push(((u32::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(6));
    encoder.write_all(&rgb).map_err(|e| e.to_string())?;
    let data = encoder.finish().map_err(|e| e.to_string())?;

    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(width)),
            "Height" => Object::Integer(i64::from(height)),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "FlateDecode",
        },
        data,
    );
    stream.allows_compression = false;
    Ok(stream)
}

/// Encode text for a WinAnsi font; characters outside the code page
/// become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let (bytes, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use chrono::Utc;
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::report::{Section, SectionKind};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn model(sections: Vec<Section>) -> DocumentModel {
        DocumentModel {
            title: "Café course".into(),
            generated_at: Utc::now(),
            sections,
        }
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("plain"), b"plain");
        assert_eq!(win_ansi("café \u{2022}"), b"caf\xe9 \x95");
        assert_eq!(win_ansi("日本"), b"??");
    }

    #[test]
    fn test_sections_start_new_pages() {
        let mut a = Section::new(SectionKind::Title, "A");
        a.heading(1, "A");
        let mut b = Section::new(SectionKind::CourseStructure, "B");
        b.heading(1, "B");
        b.paragraph("Body text.");
        let bytes = PdfRenderer::new().render(&model(vec![a, b])).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&bytes), 2);
    }

    #[test]
    fn test_hints_and_overflow_add_pages() {
        let mut section = Section::new(SectionKind::Content, "P");
        section.paragraph("one");
        section.push(Block::PageBreakHint);
        section.paragraph("two");
        let bytes = PdfRenderer::new().render(&model(vec![section])).unwrap();
        assert_eq!(page_count(&bytes), 2);

        let mut long = Section::new(SectionKind::RawContent, "Raw");
        long.push(Block::Preformatted("line\n".repeat(200)));
        let bytes = PdfRenderer::new().render(&model(vec![long])).unwrap();
        assert!(page_count(&bytes) >= 2);
    }

    #[test]
    fn test_images_embed_or_fall_back() {
        let good = ImageRef {
            source: "a.png".into(),
            caption: "Chart".into(),
            resolved_path: Some("a.png".into()),
            bytes: Some(Arc::from(png(40, 20))),
            pixel_size: Some((40, 20)),
            ..Default::default()
        };
        let broken = ImageRef {
            source: "b.png".into(),
            caption: "Broken".into(),
            resolved_path: Some("b.png".into()),
            bytes: Some(Arc::from(&b"\x89PNG\r\n\x1a\nnot really"[..])),
            pixel_size: Some((10, 10)),
            ..Default::default()
        };
        let mut section = Section::new(SectionKind::Content, "P");
        section.push(Block::Image(good.clone()));
        section.push(Block::Image(good));
        section.push(Block::Image(broken));

        let mut canvas = Canvas::new(PageMetrics::default());
        canvas.start_section();
        for block in &section.blocks {
            canvas.block(block);
        }
        assert_eq!(canvas.images.len(), 2);
        assert_eq!(canvas.images["a.png"].as_deref(), Some("Im1"));
        assert_eq!(canvas.images["b.png"], None);
        assert_eq!(canvas.xobjects.len(), 1);

        let bytes = canvas.finish(&model(vec![])).unwrap();
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_empty_model_is_one_blank_page() {
        let bytes = PdfRenderer::new().render(&model(vec![])).unwrap();
        assert_eq!(page_count(&bytes), 1);
    }
}
