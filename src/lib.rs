//! # scorm-report
//!
//! Turns SCORM course packages into paginated reports.
//!
//! ## Features
//!
//! - Parse `imsmanifest.xml` into a typed organization/item/resource model
//! - Heuristically extract lessons, quizzes, images, navigation and
//!   interactive elements from arbitrary course HTML
//! - Resolve image references against the package file set
//! - Assemble a paginated document model and render it to PDF or text
//!
//! ## Quick Start
//!
//! ```no_run
//! use scorm_report::{OutputFormat, ReportConfig, render_package, Package};
//!
//! let package = Package::open("course.zip").unwrap();
//! let (name, bytes) = render_package(&package, &ReportConfig::default(), OutputFormat::Pdf).unwrap();
//! std::fs::write(name, bytes).unwrap();
//! ```
//!
//! ## Extraction Rules
//!
//! Every DOM predicate the extractor uses is a CSS selector held in
//! [`ExtractionRules`], so new page templates are handled by configuration:
//!
//! ```
//! use scorm_report::{ExtractionRules, extract_page};
//!
//! let mut rules = ExtractionRules::default();
//! rules.lesson_containers.insert(0, ".topic".into());
//! let rules = rules.compile().unwrap();
//!
//! let page = extract_page(
//!     "page.html",
//!     r#"<div class="topic"><h2>Safety</h2><p>Always wear a helmet on site.</p></div>"#,
//!     &rules,
//! );
//! assert_eq!(page.lessons[0].title, "Safety");
//! ```

pub mod assets;
pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod render;
pub mod report;
pub(crate) mod util;

pub use config::ReportConfig;
pub use error::{Error, Result};
pub use extract::{ExtractedContent, ExtractionRules, extract_page};
pub use manifest::{CourseManifest, parse_manifest};
pub use package::Package;
pub use pipeline::{Report, generate_report, generate_report_at, render_package};
pub use render::{OutputFormat, PdfRenderer, Renderer, TextRenderer, report_filename};
pub use report::{DocumentModel, ReportAssembler};
