//! End-to-end report generation over zipped packages.

mod common;

use chrono::TimeZone;
use chrono::Utc;

use common::{COURSE_MANIFEST, png, zip_of};
use scorm_report::report::{Block, SectionKind};
use scorm_report::{Error, OutputFormat, Package, ReportConfig, generate_report, generate_report_at};

fn course_package() -> Package {
    let html = format!(
        r#"<!DOCTYPE html>
<html><head><title>Welcome Page</title></head>
<body>
  <div class="lesson">
    <h2>Getting Started</h2>
    <p>{}</p>
    <img src="pic.png" alt="Overview diagram">
  </div>
</body></html>"#,
        "a".repeat(40)
    );
    let pic = png(64, 32);
    let bytes = zip_of(&[
        ("imsmanifest.xml", COURSE_MANIFEST.as_bytes()),
        ("index.html", html.as_bytes()),
        ("pic.png", &pic),
    ]);
    Package::from_zip_bytes(&bytes).unwrap()
}

#[test]
fn test_course_report_model() {
    let report = generate_report(&course_package(), &ReportConfig::default()).unwrap();

    assert_eq!(report.manifest.identifier, "COURSE-1");
    assert_eq!(report.document.title, "Intro");

    let structure = report.document.section(SectionKind::CourseStructure).unwrap();
    let headings: Vec<_> = structure
        .content_blocks()
        .filter_map(|b| match b {
            Block::Heading { level: 2, text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(headings, ["Intro"]);
    let items = structure
        .content_blocks()
        .filter(|b| matches!(b, Block::ListItem { indent: 0, text } if text.contains("[ITEM-")))
        .count();
    assert_eq!(items, 2);

    assert_eq!(report.pages.len(), 1);
    let lessons = &report.pages[0].lessons;
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0].title, "Getting Started");
    assert_eq!(lessons[0].paragraphs.len(), 1);
    assert_eq!(lessons[0].images.len(), 1);
    assert!(lessons[0].images[0].is_resolved());
    assert_eq!(lessons[0].images[0].pixel_size, Some((64, 32)));

    let content = report.document.section(SectionKind::Content).unwrap();
    let images: Vec<_> = content
        .content_blocks()
        .filter_map(|b| match b {
            Block::Image(image) => Some(image),
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].resolved_path.as_deref(), Some("pic.png"));
    assert_eq!(report.unresolved_images(), 0);
}

#[test]
fn test_missing_manifest_aborts() {
    let bytes = zip_of(&[("index.html", b"<p>Some page text that is long enough.</p>")]);
    let package = Package::from_zip_bytes(&bytes).unwrap();
    let err = generate_report(&package, &ReportConfig::default()).unwrap_err();
    assert!(matches!(err, Error::ManifestMissing));
    assert!(err.is_client_error());
}

#[test]
fn test_unreadable_archive_is_client_error() {
    let err = Package::from_zip_bytes(b"definitely not a zip").unwrap_err();
    assert!(matches!(err, Error::ArchiveRead(_)));
    assert!(err.is_client_error());
}

#[test]
fn test_missing_image_degrades_to_placeholder() {
    let bytes = zip_of(&[
        ("imsmanifest.xml", COURSE_MANIFEST.as_bytes()),
        (
            "index.html",
            br#"<div class="lesson"><h2>Gone</h2><img src="missing.png" alt="Lost"></div>"#,
        ),
    ]);
    let package = Package::from_zip_bytes(&bytes).unwrap();
    let config = ReportConfig::default();
    let report = generate_report(&package, &config).unwrap();
    assert_eq!(report.unresolved_images(), 1);

    let text = String::from_utf8(report.render(OutputFormat::Text, &config).unwrap()).unwrap();
    assert!(text.contains("[Image: Lost]"));
    assert!(text.contains("Lost (missing.png) -> not found in package"));
}

#[test]
fn test_pdf_output() {
    let config = ReportConfig::default();
    let report = generate_report_at(
        &course_package(),
        &config,
        Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap(),
    )
    .unwrap();
    let bytes = report.render(OutputFormat::Pdf, &config).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let pdf = lopdf::Document::load_mem(&bytes).unwrap();
    // Title, structure, one page, technical summary and raw content.
    assert!(pdf.get_pages().len() >= 5);
    assert_eq!(report.filename(OutputFormat::Pdf), "Intro_20250630_235959.pdf");
}

#[test]
fn test_package_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("course.zip");
    let pic = png(8, 8);
    std::fs::write(
        &path,
        zip_of(&[
            ("imsmanifest.xml", COURSE_MANIFEST.as_bytes()),
            ("index.html", b"<p>Plenty of page text to count as a fallback lesson.</p>"),
            ("pic.png", &pic),
        ]),
    )
    .unwrap();

    let package = Package::open(&path).unwrap();
    let config = ReportConfig::default().with_raw_content(false);
    let report = generate_report(&package, &config).unwrap();
    assert!(report.document.section(SectionKind::RawContent).is_none());
    assert_eq!(report.pages[0].lessons.len(), 1);
}
