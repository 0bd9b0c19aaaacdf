//! End-to-end report generation.
//!
//! One request runs manifest parsing, per-page extraction, asset
//! attachment and assembly to completion before anything is rendered. The
//! manifest is located and parsed before any page is touched, so a package
//! without one fails fast with [`Error::ManifestMissing`].
//!
//! ```no_run
//! use scorm_report::{OutputFormat, Package, ReportConfig, generate_report};
//!
//! let package = Package::open("course.zip").unwrap();
//! let report = generate_report(&package, &ReportConfig::default()).unwrap();
//! let pdf = report.render(OutputFormat::Pdf, &ReportConfig::default()).unwrap();
//! std::fs::write(report.filename(OutputFormat::Pdf), pdf).unwrap();
//! ```

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::assets::attach_assets;
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::extract::{CompiledRules, ExtractedContent, extract_page};
use crate::manifest::{CourseManifest, parse_manifest};
use crate::package::Package;
use crate::render::{OutputFormat, report_filename};
use crate::report::{DocumentModel, ReportAssembler};

/// Everything produced for one package, ready to render.
#[derive(Debug, Clone)]
pub struct Report {
    pub manifest: CourseManifest,
    /// One record per HTML entry, in file-set order.
    pub pages: Vec<ExtractedContent>,
    pub document: DocumentModel,
}

impl Report {
    pub fn render(&self, format: OutputFormat, config: &ReportConfig) -> Result<Vec<u8>> {
        let bytes = format.renderer(config.page).render(&self.document)?;
        info!(format = %format, bytes = bytes.len(), "rendered report");
        Ok(bytes)
    }

    /// Download name derived from the document title and generation time.
    pub fn filename(&self, format: OutputFormat) -> String {
        report_filename(&self.document.title, self.document.generated_at, format)
    }

    /// Images whose bytes were never found in the package. Lesson images
    /// are copies of page images and are not counted twice.
    pub fn unresolved_images(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| &p.images)
            .filter(|img| !img.is_resolved())
            .count()
    }
}

/// Locate and parse the package manifest.
pub fn load_manifest(package: &Package) -> Result<CourseManifest> {
    let entry = package.manifest().ok_or(Error::ManifestMissing)?;
    let manifest = parse_manifest(&entry.text())?;
    info!(
        path = %entry.path,
        identifier = %manifest.identifier,
        organizations = manifest.organizations.len(),
        resources = manifest.resources.len(),
        "parsed manifest"
    );
    Ok(manifest)
}

/// Extract every HTML entry in parallel and attach image bytes. The result
/// keeps file-set order.
pub fn extract_pages(package: &Package, rules: &CompiledRules) -> Vec<ExtractedContent> {
    let files: Vec<_> = package.html_files().collect();
    files
        .par_iter()
        .map(|file| {
            let mut content = extract_page(&file.path, &file.text(), rules);
            let unresolved = attach_assets(&mut content, package);
            debug!(
                page = %file.path,
                lessons = content.lessons.len(),
                quizzes = content.quizzes.len(),
                images = content.images.len(),
                unresolved,
                "extracted page"
            );
            content
        })
        .collect()
}

/// Run the whole pipeline, stamping the report with the current time.
pub fn generate_report(package: &Package, config: &ReportConfig) -> Result<Report> {
    generate_report_at(package, config, Utc::now())
}

/// Run the whole pipeline with a fixed generation timestamp.
pub fn generate_report_at(
    package: &Package,
    config: &ReportConfig,
    generated_at: DateTime<Utc>,
) -> Result<Report> {
    let manifest = load_manifest(package)?;

    if package.html_files().next().is_none() {
        return Err(Error::NoContent);
    }
    let rules = config.rules.compile()?;

    let pages = extract_pages(package, &rules);
    info!(pages = pages.len(), "extracted pages");

    let document = ReportAssembler::new(config)
        .generated_at(generated_at)
        .assemble(&manifest, &pages, package);
    info!(sections = document.sections.len(), "assembled report");

    Ok(Report {
        manifest,
        pages,
        document,
    })
}

/// Generate and render in one step, returning the file name and bytes.
pub fn render_package(
    package: &Package,
    config: &ReportConfig,
    format: OutputFormat,
) -> Result<(String, Vec<u8>)> {
    let report = generate_report(package, config)?;
    let bytes = report.render(format, config)?;
    Ok((report.filename(format), bytes))
}
