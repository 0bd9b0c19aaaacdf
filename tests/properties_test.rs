//! Property tests for manifest trees, truncation and pagination.

use std::sync::Arc;

use proptest::prelude::*;

use scorm_report::extract::ImageRef;
use scorm_report::manifest::ItemNode;
use scorm_report::parse_manifest;
use scorm_report::report::{Block, PageMetrics, TRUNCATION_MARKER, paginate, truncate_content};

/// Item tree shape: each node is its list of children.
#[derive(Debug, Clone)]
struct Shape(Vec<Shape>);

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = Just(Shape(Vec::new()));
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Shape)
    })
}

fn write_items(shapes: &[Shape], prefix: &str, out: &mut String) {
    for (i, shape) in shapes.iter().enumerate() {
        let id = format!("{prefix}-{i}");
        out.push_str(&format!(
            "<item identifier=\"{id}\" identifierref=\"R\"><title>T {id}</title>"
        ));
        write_items(&shape.0, &id, out);
        out.push_str("</item>");
    }
}

fn manifest_xml(orgs: &[Vec<Shape>]) -> String {
    let mut xml = String::from("<manifest identifier=\"P\"><organizations>");
    for (i, items) in orgs.iter().enumerate() {
        xml.push_str(&format!(
            "<organization identifier=\"O{i}\"><title>Org {i}</title>"
        ));
        write_items(items, &format!("I{i}"), &mut xml);
        xml.push_str("</organization>");
    }
    xml.push_str("</organizations><resources/></manifest>");
    xml
}

fn same_tree(items: &[ItemNode], shapes: &[Shape], prefix: &str, depth: usize) -> bool {
    items.len() == shapes.len()
        && items.iter().zip(shapes).enumerate().all(|(i, (item, shape))| {
            let id = format!("{prefix}-{i}");
            item.identifier == id
                && item.title == format!("T {id}")
                && item.depth == depth
                && same_tree(&item.children, &shape.0, &id, depth + 1)
        })
}

fn tall_image() -> Block {
    Block::Image(ImageRef {
        source: "big.png".into(),
        bytes: Some(Arc::from(&b"png"[..])),
        pixel_size: Some((1000, 1000)),
        ..Default::default()
    })
}

/// The longest paragraph of repeated words that still fits on one page, so
/// whatever space it leaves is less than the next paragraph needs.
fn page_filling_paragraph(metrics: &PageMetrics) -> Block {
    let para = |words: usize| Block::Paragraph("word ".repeat(words).trim_end().to_string());
    let (mut lo, mut hi) = (1usize, 1usize);
    while metrics.block_height(&para(hi)) <= metrics.body_height() {
        lo = hi;
        hi *= 2;
    }
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if metrics.block_height(&para(mid)) <= metrics.body_height() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    para(lo)
}

proptest! {
    #[test]
    fn prop_manifest_tree_mirrors_markup(orgs in prop::collection::vec(prop::collection::vec(shape(), 0..4), 0..4)) {
        let manifest = parse_manifest(&manifest_xml(&orgs)).unwrap();
        prop_assert_eq!(manifest.organizations.len(), orgs.len());
        for (i, (org, shapes)) in manifest.organizations.iter().zip(&orgs).enumerate() {
            let prefix = format!("I{i}");
            prop_assert!(same_tree(&org.items, shapes, &prefix, 0));
        }
    }

    #[test]
    fn prop_truncation_never_exceeds_limit(text in ".{0,300}", limit in 0usize..200) {
        let out = truncate_content(&text, limit);
        if text.chars().count() <= limit {
            prop_assert_eq!(&*out, text.as_str());
        } else {
            let (kept, marker) = out.rsplit_once('\n').unwrap();
            prop_assert_eq!(marker, TRUNCATION_MARKER);
            prop_assert_eq!(kept.chars().count(), limit);
            prop_assert!(text.starts_with(kept));
        }
    }

    #[test]
    fn prop_blocks_that_never_fit_break_before_each(n in 1usize..12) {
        let metrics = PageMetrics::default();
        let blocks = vec![tall_image(); n];
        let out = paginate(blocks, &metrics);

        prop_assert_eq!(out.len(), 2 * n - 1);
        for (i, block) in out.iter().enumerate() {
            let is_hint = matches!(block, Block::PageBreakHint);
            prop_assert_eq!(is_hint, i % 2 == 1);
        }
    }

    #[test]
    fn prop_full_page_paragraphs_break_before_each(n in 1usize..12) {
        let metrics = PageMetrics::default();
        let block = page_filling_paragraph(&metrics);
        let left = metrics.body_height() - metrics.block_height(&block);
        prop_assert!(left < metrics.reservation(&block));

        let out = paginate(vec![block; n], &metrics);
        let hints: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b, Block::PageBreakHint))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(hints.len(), n - 1);
        prop_assert_eq!(out.len(), 2 * n - 1);
        for i in hints {
            prop_assert!(matches!(out.get(i + 1), Some(Block::Paragraph(_))));
        }
    }
}

#[test]
fn test_truncation_of_six_thousand_chars() {
    let text = "x".repeat(6000);
    let out = truncate_content(&text, 5000);
    assert_eq!(out, format!("{}\n{TRUNCATION_MARKER}", "x".repeat(5000)));
}
