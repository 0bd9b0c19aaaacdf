//! Lesson extraction.
//!
//! Primary strategy: lesson-like containers from the first container rule
//! that yields a lesson with content. Fallback, when no rule yields one:
//! one synthetic lesson built from leaf text blocks of the whole body.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{CompiledRules, ImageRef, LessonBlock, first_productive};
use crate::dom::{NodeId, PageDom};

/// Paragraphs never come from inside these.
const PARAGRAPH_EXCLUDED: [&str; 3] = ["script", "style", "nav"];

/// Fallback text never comes from inside these.
const FALLBACK_EXCLUDED: [&str; 6] = ["script", "style", "nav", "header", "footer", "noscript"];

const FALLBACK_CANDIDATES: [&str; 4] = ["p", "div", "span", "li"];

/// Candidates containing one of these are wrappers, not text blocks.
const FALLBACK_BLOCKS: [&str; 3] = ["p", "div", "li"];

/// Script source that leaked into visible text.
const SCRIPT_MARKERS: [&str; 2] = ["javascript", "function"];

pub(super) fn extract(
    dom: &PageDom,
    rules: &CompiledRules,
    images: &[(NodeId, ImageRef)],
    page_title: &str,
) -> Vec<LessonBlock> {
    let by_node: HashMap<NodeId, &ImageRef> = images.iter().map(|(id, img)| (*id, img)).collect();
    let lessons = first_productive(dom, &rules.lesson_containers, dom.body(), |containers| {
        from_containers(dom, rules, &by_node, containers)
    });

    if lessons.is_empty() {
        debug!("no lesson containers with content, using body text fallback");
        return fallback(dom, rules, images, page_title).into_iter().collect();
    }
    lessons
}

fn from_containers(
    dom: &PageDom,
    rules: &CompiledRules,
    by_node: &HashMap<NodeId, &ImageRef>,
    containers: Vec<NodeId>,
) -> Vec<LessonBlock> {
    let mut lessons = Vec::new();

    for container in containers {
        let paragraphs = paragraphs(dom, rules, container);
        let images: Vec<ImageRef> = dom
            .descendants(container)
            .filter_map(|id| by_node.get(&id).map(|img| (*img).clone()))
            .collect();

        if paragraphs.is_empty() && images.is_empty() {
            continue;
        }

        let ordinal = lessons.len() + 1;
        let title = rules
            .lesson_titles
            .select(dom, container)
            .into_iter()
            .map(|id| dom.text(id))
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Lesson {ordinal}"));

        lessons.push(LessonBlock {
            title,
            ordinal,
            paragraphs,
            images,
        });
    }

    lessons
}

/// Paragraph texts of one container, outermost paragraph elements only.
fn paragraphs(dom: &PageDom, rules: &CompiledRules, container: NodeId) -> Vec<String> {
    let min = rules.source().min_paragraph_chars;
    let hits = rules.paragraphs.select(dom, container);
    let hit_set: HashSet<NodeId> = hits.iter().copied().collect();

    hits.iter()
        .filter(|&&id| {
            !dom.ancestors(id)
                .take_while(|&a| a != container)
                .any(|a| hit_set.contains(&a))
        })
        .filter(|&&id| !dom.has_ancestor_tag(id, &PARAGRAPH_EXCLUDED))
        .map(|&id| dom.text(id))
        .filter(|text| text.chars().count() > min)
        .collect()
}

/// One lesson from the body's leaf text blocks.
///
/// A candidate is kept only when it holds no nested block candidate and no
/// ancestor was already kept, so each piece of text is counted once even
/// when it appears at several DOM levels.
fn fallback(
    dom: &PageDom,
    rules: &CompiledRules,
    images: &[(NodeId, ImageRef)],
    page_title: &str,
) -> Option<LessonBlock> {
    let min = rules.source().min_fallback_chars;
    let mut kept: HashSet<NodeId> = HashSet::new();
    let mut paragraphs = Vec::new();

    for id in dom.descendants(dom.body()) {
        if !dom.has_tag(id, &FALLBACK_CANDIDATES)
            || dom.has_ancestor_tag(id, &FALLBACK_EXCLUDED)
            || dom.ancestors(id).any(|a| kept.contains(&a))
            || dom.descendants(id).any(|d| dom.has_tag(d, &FALLBACK_BLOCKS))
        {
            continue;
        }

        let text = dom.text(id);
        if text.chars().count() <= min || is_script_leak(&text) {
            continue;
        }

        kept.insert(id);
        paragraphs.push(text);
    }

    let images: Vec<ImageRef> = images.iter().map(|(_, img)| img.clone()).collect();
    if paragraphs.is_empty() && images.is_empty() {
        return None;
    }

    Some(LessonBlock {
        title: page_title.to_string(),
        ordinal: 1,
        paragraphs,
        images,
    })
}

fn is_script_leak(text: &str) -> bool {
    let lower = text.to_lowercase();
    SCRIPT_MARKERS.iter().any(|m| lower.contains(m))
}
