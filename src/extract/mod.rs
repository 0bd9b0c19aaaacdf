//! Heuristic content extraction from course pages.
//!
//! Authoring tools emit wildly different markup, so nothing here relies on
//! a content model. Instead each concern (lessons, quizzes, navigation, ...)
//! is found by a prioritised list of structural predicates from
//! [`ExtractionRules`], evaluated against a parsed [`PageDom`].
//!
//! Extraction is pure: it never mutates the page, visits nodes in document
//! order, and returns defaults rather than errors for anything missing.

mod lessons;
mod page;
mod quiz;
mod rules;

pub use rules::{CompiledRules, ExtractionRules};

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::dom::{NodeId, PageDom, SelectorRule, parse_html};

/// Everything extracted from one HTML page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedContent {
    pub source_path: String,
    pub title: String,
    pub heading_outline: Vec<HeadingEntry>,
    pub navigation: Vec<NavEntry>,
    pub lessons: Vec<LessonBlock>,
    pub quizzes: Vec<QuizBlock>,
    pub images: Vec<ImageRef>,
    pub interactions: Vec<Interaction>,
    pub links: Vec<Link>,
}

impl ExtractedContent {
    /// Whether the page yielded anything worth a report section.
    pub fn is_empty(&self) -> bool {
        self.heading_outline.is_empty()
            && self.lessons.is_empty()
            && self.quizzes.is_empty()
            && self.images.is_empty()
            && self.navigation.is_empty()
            && self.interactions.is_empty()
            && self.links.is_empty()
    }

    /// Every image on the page plus every lesson image, for bulk updates.
    pub fn images_mut(&mut self) -> impl Iterator<Item = &mut ImageRef> {
        self.images
            .iter_mut()
            .chain(self.lessons.iter_mut().flat_map(|l| l.images.iter_mut()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingEntry {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub text: String,
    /// First anchor `href` inside the entry; empty when there is none.
    pub link: String,
    pub is_active: bool,
}

/// A lesson: titled prose plus its images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonBlock {
    pub title: String,
    /// 1-based position among the page's retained lessons.
    pub ordinal: usize,
    pub paragraphs: Vec<String>,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizBlock {
    pub title: String,
    pub questions: Vec<QuestionBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBlock {
    /// 1-based position within the quiz.
    pub ordinal: usize,
    pub text: String,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    /// `A`, `B`, ... `Z`, `AA`, ...
    pub label: String,
    pub text: String,
}

/// An `<img>` reference and, once resolved, its bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageRef {
    /// `src` exactly as written in the markup.
    pub source: String,
    pub alt: String,
    pub title: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Alt text, else title, else `Image {n}`.
    pub caption: String,
    /// Package path the source resolved to.
    pub resolved_path: Option<String>,
    #[serde(skip)]
    pub bytes: Option<Arc<[u8]>>,
    /// Pixel size sniffed from the resolved bytes.
    pub pixel_size: Option<(u32, u32)>,
}

impl ImageRef {
    pub fn is_resolved(&self) -> bool {
        self.bytes.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Button,
    Input,
    Link,
    Element,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Button => "button",
            InteractionKind::Input => "input",
            InteractionKind::Link => "link",
            InteractionKind::Element => "element",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interaction {
    pub kind: InteractionKind,
    pub text: String,
    /// Inline handler source, truncated; never executed.
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

/// Extract one page.
///
/// `path` is the page's package path; it names the record and supplies the
/// last-resort title.
pub fn extract_page(path: &str, html: &str, rules: &CompiledRules) -> ExtractedContent {
    let dom = parse_html(html);
    extract_dom(path, &dom, rules)
}

/// Extract an already-parsed page.
pub fn extract_dom(path: &str, dom: &PageDom, rules: &CompiledRules) -> ExtractedContent {
    let title = page::title(dom, path);
    let images = page::images(dom, rules);
    let lessons = lessons::extract(dom, rules, &images, &title);

    ExtractedContent {
        source_path: path.to_string(),
        heading_outline: page::heading_outline(dom, rules),
        navigation: page::navigation(dom, rules),
        quizzes: quiz::extract(dom, rules),
        interactions: page::interactions(dom, rules),
        links: page::links(dom, rules),
        lessons,
        images: images.into_iter().map(|(_, image)| image).collect(),
        title,
    }
}

/// Output of the first rule whose outermost matches under `root` produce
/// anything. A rule that matches only empty containers falls through to
/// the next one.
fn first_productive<T>(
    dom: &PageDom,
    rules: &[SelectorRule],
    root: NodeId,
    mut produce: impl FnMut(Vec<NodeId>) -> Vec<T>,
) -> Vec<T> {
    for rule in rules {
        let hits = rule.select(dom, root);
        if hits.is_empty() {
            continue;
        }
        let out = produce(outermost(dom, hits));
        if !out.is_empty() {
            return out;
        }
    }
    Vec::new()
}

/// Drop nodes that sit inside another node of the set.
fn outermost(dom: &PageDom, nodes: Vec<NodeId>) -> Vec<NodeId> {
    let set: HashSet<NodeId> = nodes.iter().copied().collect();
    nodes
        .into_iter()
        .filter(|&id| !dom.ancestors(id).any(|a| set.contains(&a)))
        .collect()
}

/// Drop nodes that contain another node of the set.
fn innermost(dom: &PageDom, nodes: Vec<NodeId>) -> Vec<NodeId> {
    let mut containing: HashSet<NodeId> = HashSet::new();
    for &id in &nodes {
        containing.extend(dom.ancestors(id));
    }
    nodes
        .into_iter()
        .filter(|id| !containing.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> CompiledRules {
        ExtractionRules::default().compile().unwrap()
    }

    #[test]
    fn test_outermost_and_innermost() {
        let dom = parse_html(r#"<div id=a><div id=b><div id=c></div></div></div><div id=d></div>"#);
        let divs = SelectorRule::parse("div").unwrap().select(&dom, dom.document());
        let ids = |nodes: Vec<NodeId>| -> Vec<String> {
            nodes
                .into_iter()
                .map(|n| dom.attr(n, "id").unwrap().to_string())
                .collect()
        };
        assert_eq!(ids(outermost(&dom, divs.clone())), ["a", "d"]);
        assert_eq!(ids(innermost(&dom, divs)), ["c", "d"]);
    }

    #[test]
    fn test_first_productive_rule_wins() {
        let dom = parse_html(
            r#"<section class="slide">s</section><article>a</article><aside>x</aside>"#,
        );
        let rules = [
            SelectorRule::parse(".missing").unwrap(),
            SelectorRule::parse("aside").unwrap(),
            SelectorRule::parse("article").unwrap(),
            SelectorRule::parse("section").unwrap(),
        ];
        // `aside` matches but produces nothing, so `article` decides.
        let tags = first_productive(&dom, &rules, dom.document(), |nodes| {
            nodes
                .into_iter()
                .filter(|&n| dom.tag(n) != Some("aside"))
                .map(|n| dom.tag(n).unwrap_or_default().to_string())
                .collect()
        });
        assert_eq!(tags, ["article"]);
    }

    #[test]
    fn test_first_productive_without_output_is_empty() {
        let dom = parse_html("<p>nothing</p>");
        let rules = [SelectorRule::parse("p").unwrap()];
        let out: Vec<NodeId> = first_productive(&dom, &rules, dom.document(), |_| Vec::new());
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_page_yields_defaults() {
        let content = extract_page("content/blank.html", "", &rules());
        assert_eq!(content.source_path, "content/blank.html");
        assert_eq!(content.title, "blank.html");
        assert!(content.is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"<html><head><title>Unit 1</title></head><body>
            <nav><ul><li class="active"><a href="p1.html">Overview</a></li></ul></nav>
            <div class="lesson"><h2>Cells</h2>
              <p>All living things are made of one or more cells.</p>
              <img src="img/cell.png" alt="A cell"></div>
            <div class="quiz"><div class="question"><p>What is a cell?</p>
              <label><input type="radio" name="q1" value="a">A unit of life</label>
              <label><input type="radio" name="q1" value="b">A rock</label></div></div>
            <button onclick="next()">Next</button>
            </body></html>"#;
        let rules = rules();
        let first = extract_page("p1.html", html, &rules);
        let second = extract_page("p1.html", html, &rules);
        assert_eq!(first, second);
        assert_eq!(first.lessons.len(), 1);
        assert_eq!(first.quizzes.len(), 1);
        assert_eq!(first.navigation.len(), 1);
    }
}
