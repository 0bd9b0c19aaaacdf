//! Merge the manifest and page extractions into a [`DocumentModel`].

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use super::model::{Block, DocumentModel, Section, SectionKind};
use super::paginate::paginate;
use super::truncate_content;
use crate::config::ReportConfig;
use crate::extract::ExtractedContent;
use crate::manifest::CourseManifest;
use crate::package::{FileClass, Package};

/// Builds the report document for one package.
#[derive(Debug, Clone)]
pub struct ReportAssembler<'a> {
    config: &'a ReportConfig,
    generated_at: DateTime<Utc>,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self {
            config,
            generated_at: Utc::now(),
        }
    }

    /// Fix the generation timestamp (reproducible output).
    pub fn generated_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.generated_at = timestamp;
        self
    }

    /// `pages` must be in file-set order.
    pub fn assemble(
        &self,
        manifest: &CourseManifest,
        pages: &[ExtractedContent],
        package: &Package,
    ) -> DocumentModel {
        let title = document_title(manifest, pages);

        let mut sections = vec![
            self.title_section(&title, manifest, pages),
            self.structure_section(manifest),
        ];
        sections.extend(pages.iter().map(|page| self.content_section(page)));
        sections.push(self.technical_section(manifest, package));
        if self.config.include_raw_content {
            sections.push(self.raw_section(package));
        }

        for section in &mut sections {
            let blocks = std::mem::take(&mut section.blocks);
            section.blocks = paginate(blocks, &self.config.page);
        }

        let doc = DocumentModel {
            title,
            generated_at: self.generated_at,
            sections,
        };
        debug!(
            sections = doc.sections.len(),
            page_breaks = doc.page_break_count(),
            "assembled report"
        );
        doc
    }

    fn title_section(&self, title: &str, manifest: &CourseManifest, pages: &[ExtractedContent]) -> Section {
        let lessons: usize = pages.iter().map(|p| p.lessons.len()).sum();
        let quizzes: usize = pages.iter().map(|p| p.quizzes.len()).sum();
        let questions: usize = pages
            .iter()
            .flat_map(|p| &p.quizzes)
            .map(|q| q.questions.len())
            .sum();
        let images: usize = pages.iter().map(|p| p.images.len()).sum();

        let mut section = Section::new(SectionKind::Title, "SCORM Package Report");
        section.heading(1, title);
        section.list_item(0, format!("Identifier: {}", or_dash(&manifest.identifier)));
        section.list_item(0, format!("Version: {}", or_dash(&manifest.version)));
        if !manifest.schema.is_empty() || !manifest.schema_version.is_empty() {
            section.list_item(
                0,
                format!(
                    "Schema: {} {}",
                    or_dash(&manifest.schema),
                    manifest.schema_version
                )
                .trim_end()
                .to_string(),
            );
        }
        section.list_item(
            0,
            format!(
                "Generated: {}",
                self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        );
        section.heading(2, "Summary");
        section.list_item(0, format!("Pages: {}", pages.len()));
        section.list_item(0, format!("Lessons: {lessons}"));
        section.list_item(0, format!("Quizzes: {quizzes} ({questions} questions)"));
        section.list_item(0, format!("Images: {images}"));
        section
    }

    fn structure_section(&self, manifest: &CourseManifest) -> Section {
        let mut section = Section::new(SectionKind::CourseStructure, "Course Structure");
        section.heading(1, "Course Structure");

        if manifest.organizations.is_empty() {
            section.paragraph("The manifest defines no organizations.");
            return section;
        }

        for org in &manifest.organizations {
            let name = if org.title.is_empty() { &org.identifier } else { &org.title };
            section.heading(2, or_dash(name));
            let mut summary = format!("{} items", org.item_count());
            if !org.identifier.is_empty() {
                summary = format!("Organization {}: {summary}", org.identifier);
            }
            if !manifest.default_organization.is_empty()
                && manifest.default_organization == org.identifier
            {
                summary.push_str(" (default)");
            }
            section.paragraph(summary);

            for item in org.walk() {
                let mut line = or_dash(&item.title).to_string();
                if !item.identifier.is_empty() {
                    line.push_str(&format!(" [{}]", item.identifier));
                }
                if !item.identifierref.is_empty() {
                    line.push_str(&format!(" -> {}", item.identifierref));
                }
                section.list_item(item.depth, line);
            }
        }
        section
    }

    fn content_section(&self, page: &ExtractedContent) -> Section {
        let mut section = Section::new(SectionKind::Content, page.title.clone());
        section.heading(1, page.title.clone());
        section.paragraph(format!("Source: {}", page.source_path));

        if !page.heading_outline.is_empty() {
            section.heading(3, "Outline");
            for heading in &page.heading_outline {
                section.list_item(usize::from(heading.level.saturating_sub(1)), heading.text.clone());
            }
        }

        for lesson in &page.lessons {
            section.heading(2, lesson.title.clone());
            for paragraph in &lesson.paragraphs {
                section.paragraph(paragraph.clone());
            }
            for image in &lesson.images {
                section.push(Block::Image(image.clone()));
            }
        }

        for quiz in &page.quizzes {
            section.push(Block::Quiz(quiz.clone()));
        }

        if !page.navigation.is_empty() {
            section.heading(3, "Navigation");
            for entry in &page.navigation {
                let mut line = entry.text.clone();
                if !entry.link.is_empty() {
                    line.push_str(&format!(" ({})", entry.link));
                }
                if entry.is_active {
                    line.push_str(" [active]");
                }
                section.list_item(0, line);
            }
        }

        if !page.interactions.is_empty() {
            section.heading(3, "Interactive Elements");
            for interaction in &page.interactions {
                let mut line = format!("[{}] {}", interaction.kind.as_str(), interaction.text);
                if let Some(action) = &interaction.action {
                    line.push_str(&format!(" (action: {action})"));
                }
                section.list_item(0, line);
            }
        }

        if !page.links.is_empty() {
            section.heading(3, "Links");
            for link in &page.links {
                section.list_item(0, format!("{} ({})", link.text, link.url));
            }
        }

        if !page.images.is_empty() {
            section.heading(3, "Images");
            for image in &page.images {
                let location = match &image.resolved_path {
                    Some(path) => path.clone(),
                    None => "not found in package".to_string(),
                };
                section.list_item(0, format!("{} ({}) -> {location}", image.caption, image.source));
            }
        }

        section
    }

    fn technical_section(&self, manifest: &CourseManifest, package: &Package) -> Section {
        let mut section = Section::new(SectionKind::TechnicalSummary, "Technical Summary");
        section.heading(1, "Technical Summary");

        section.heading(2, "File Types");
        let mut counts: Vec<(FileClass, usize)> = Vec::new();
        for file in package.files() {
            let class = file.class();
            match counts.iter_mut().find(|(c, _)| *c == class) {
                Some((_, n)) => *n += 1,
                None => counts.push((class, 1)),
            }
        }
        counts.sort_by_key(|(class, _)| *class);
        for (class, count) in counts {
            section.list_item(0, format!("{}: {count}", class.label()));
        }
        section.list_item(0, format!("Total files: {}", package.len()));

        section.heading(2, "Resources");
        if manifest.resources.is_empty() {
            section.paragraph("The manifest declares no resources.");
        }
        for resource in &manifest.resources {
            let mut line = format!("{} ({}", or_dash(&resource.identifier), or_dash(&resource.kind));
            if !resource.scorm_type.is_empty() {
                line.push_str(&format!(", {}", resource.scorm_type));
            }
            line.push(')');
            if !resource.href.is_empty() {
                line.push_str(&format!(" {}", resource.href));
            }
            line.push_str(&format!(" [{} files]", resource.files.len()));
            section.list_item(0, line);
            if !resource.dependencies.is_empty() {
                section.list_item(1, format!("Depends on: {}", resource.dependencies.join(", ")));
            }
        }

        if self.config.include_file_listing {
            section.heading(2, "Files");
            let mut files: Vec<_> = package.files().iter().collect();
            files.sort_by(|a, b| a.path.cmp(&b.path));
            for file in files {
                section.list_item(0, format!("{} ({} bytes)", file.path, file.data.len()));
            }
        }

        section
    }

    fn raw_section(&self, package: &Package) -> Section {
        let mut section = Section::new(SectionKind::RawContent, "Raw Content");
        section.heading(1, "Raw Content");
        let manifest = package.manifest();
        let manifest_path = manifest.map(|m| m.path.as_str());

        let others = package
            .files()
            .iter()
            .filter(|f| Some(f.path.as_str()) != manifest_path);

        for file in manifest.into_iter().chain(others) {
            if !file.class().is_text(&file.data) {
                continue;
            }
            section.heading(3, file.path.clone());
            section.push(Block::Preformatted(
                truncate_content(&file.text(), self.config.truncate_limit).into_owned(),
            ));
        }
        section
    }
}

/// Manifest title, else the first page title, else a generic name.
fn document_title(manifest: &CourseManifest, pages: &[ExtractedContent]) -> String {
    let title = manifest.title();
    if !title.is_empty() {
        return title.to_string();
    }
    pages
        .iter()
        .map(|p| p.title.as_str())
        .find(|t| !t.is_empty())
        .unwrap_or("Untitled Course")
        .to_string()
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
