//! Page-level extraction: title, outline, images, navigation, interactions
//! and links.

use std::collections::HashSet;

use super::{CompiledRules, HeadingEntry, ImageRef, Interaction, InteractionKind, Link, NavEntry};
use crate::dom::{NodeId, PageDom};
use crate::util::{collapse_whitespace, ellipsize, file_name};

/// `<title>`, else the first heading, else the file name.
pub(super) fn title(dom: &PageDom, path: &str) -> String {
    dom.find_by_tag("title")
        .map(|t| dom.text(t))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            dom.descendants(dom.document())
                .filter(|&id| heading_level(dom, id).is_some())
                .map(|id| dom.text(id))
                .find(|t| !t.is_empty())
        })
        .unwrap_or_else(|| file_name(path).to_string())
}

fn heading_level(dom: &PageDom, id: NodeId) -> Option<u8> {
    match dom.tag(id)? {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

pub(super) fn heading_outline(dom: &PageDom, rules: &CompiledRules) -> Vec<HeadingEntry> {
    rules
        .headings
        .select(dom, dom.document())
        .into_iter()
        .filter_map(|id| {
            let level = heading_level(dom, id)?;
            let text = dom.text(id);
            (!text.is_empty()).then_some(HeadingEntry { level, text })
        })
        .collect()
}

/// Every `<img>` with a non-empty `src`, paired with its node so lessons can
/// reuse the same record. The source is kept exactly as written.
pub(super) fn images(dom: &PageDom, rules: &CompiledRules) -> Vec<(NodeId, ImageRef)> {
    rules
        .images
        .select(dom, dom.document())
        .into_iter()
        .filter_map(|id| raw_attr(dom, id, "src").map(|src| (id, src)))
        .enumerate()
        .map(|(i, (id, src))| {
            let alt = dom.non_empty_attr(id, "alt").map(collapse_whitespace).unwrap_or_default();
            let title = dom.non_empty_attr(id, "title").map(collapse_whitespace).unwrap_or_default();
            let caption = [&alt, &title]
                .into_iter()
                .find(|s| !s.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Image {}", i + 1));

            let image = ImageRef {
                source: src.to_string(),
                width: dom.attr(id, "width").and_then(parse_dimension),
                height: dom.attr(id, "height").and_then(parse_dimension),
                alt,
                title,
                caption,
                ..Default::default()
            };
            (id, image)
        })
        .collect()
}

/// Attribute value untouched, provided it is not blank.
fn raw_attr<'a>(dom: &'a PageDom, id: NodeId, name: &str) -> Option<&'a str> {
    dom.attr(id, name).filter(|v| !v.trim().is_empty())
}

/// `"120"`, `"120px"`; percentages and junk are ignored.
fn parse_dimension(value: &str) -> Option<u32> {
    let value = value.trim();
    let value = value.strip_suffix("px").unwrap_or(value).trim_end();
    value.parse().ok().filter(|&v| v > 0)
}

pub(super) fn navigation(dom: &PageDom, rules: &CompiledRules) -> Vec<NavEntry> {
    let config = rules.source();
    rules
        .navigation
        .select(dom, dom.document())
        .into_iter()
        .filter_map(|id| {
            let text = dom.text(id);
            if text.chars().count() <= config.min_navigation_chars {
                return None;
            }
            let anchor = dom.descendants(id).find(|&d| dom.has_tag(d, &["a"]));
            let is_active = std::iter::once(id)
                .chain(anchor)
                .any(|n| has_any_class(dom, n, &config.active_classes));
            Some(NavEntry {
                text,
                link: anchor
                    .and_then(|a| dom.attr(a, "href"))
                    .map(|h| h.trim().to_string())
                    .unwrap_or_default(),
                is_active,
            })
        })
        .collect()
}

fn has_any_class(dom: &PageDom, id: NodeId, wanted: &[String]) -> bool {
    dom.classes(id)
        .iter()
        .any(|c| wanted.iter().any(|w| c.eq_ignore_ascii_case(w)))
}

/// Controls act on their own; a wrapper matched only by class name is
/// dropped when it holds other matches, so its controls keep their text and
/// handlers.
fn is_control(dom: &PageDom, id: NodeId) -> bool {
    dom.has_tag(id, &CONTROL_TAGS)
        || dom.attr(id, "onclick").is_some()
        || dom.attr(id, "role").is_some_and(|r| r.eq_ignore_ascii_case("button"))
}

const CONTROL_TAGS: [&str; 3] = ["button", "input", "a"];

pub(super) fn interactions(dom: &PageDom, rules: &CompiledRules) -> Vec<Interaction> {
    let max = rules.source().action_max_chars;
    let hits = rules.interactions.select(dom, dom.document());
    let holders: HashSet<NodeId> = hits.iter().flat_map(|&id| dom.ancestors(id)).collect();
    hits.into_iter()
        .filter(|&id| is_control(dom, id) || !holders.contains(&id))
        .filter_map(|id| {
            let kind = match dom.tag(id) {
                Some("button") => InteractionKind::Button,
                Some("input") => InteractionKind::Input,
                Some("a") => InteractionKind::Link,
                _ => InteractionKind::Element,
            };
            let text = match kind {
                InteractionKind::Input => dom
                    .non_empty_attr(id, "value")
                    .map(collapse_whitespace)
                    .unwrap_or_default(),
                _ => dom.text(id),
            };
            if text.is_empty() {
                return None;
            }
            let action = dom
                .non_empty_attr(id, "onclick")
                .or_else(|| {
                    dom.non_empty_attr(id, "href")
                        .filter(|h| h.get(..11).is_some_and(|p| p.eq_ignore_ascii_case("javascript:")))
                })
                .map(|a| ellipsize(&collapse_whitespace(a), max));
            Some(Interaction { kind, text, action })
        })
        .collect()
}

pub(super) fn links(dom: &PageDom, rules: &CompiledRules) -> Vec<Link> {
    rules
        .links
        .select(dom, dom.document())
        .into_iter()
        .filter_map(|id| {
            let url = raw_attr(dom, id, "href")?;
            let text = dom.text(id);
            (!text.is_empty()).then(|| Link {
                url: url.to_string(),
                text,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::extract::ExtractionRules;

    fn rules() -> CompiledRules {
        ExtractionRules::default().compile().unwrap()
    }

    #[test]
    fn test_title_precedence() {
        let dom = parse_html("<title> Course   Home </title><h1>Welcome</h1>");
        assert_eq!(title(&dom, "a/index.html"), "Course Home");

        let dom = parse_html("<title>  </title><div><h3>Chapter 2</h3></div>");
        assert_eq!(title(&dom, "a/index.html"), "Chapter 2");

        let dom = parse_html("<p>nothing</p>");
        assert_eq!(title(&dom, "a/index.html"), "index.html");
    }

    #[test]
    fn test_heading_outline_skips_empty() {
        let dom = parse_html("<h1>Top</h1><h2> </h2><div><h3>Deep <em>one</em></h3></div>");
        let outline = heading_outline(&dom, &rules());
        assert_eq!(
            outline,
            [
                HeadingEntry { level: 1, text: "Top".into() },
                HeadingEntry { level: 3, text: "Deep one".into() },
            ]
        );
    }

    #[test]
    fn test_image_captions() {
        let dom = parse_html(
            r#"<img src="a.png" alt="Diagram"><img src=""><img src="b.png" title="Chart" width="300px" height="50%"><img src="c.png">"#,
        );
        let images: Vec<_> = images(&dom, &rules()).into_iter().map(|(_, i)| i).collect();
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].caption, "Diagram");
        assert_eq!(images[1].caption, "Chart");
        assert_eq!(images[1].width, Some(300));
        assert_eq!(images[1].height, None);
        assert_eq!(images[2].caption, "Image 3");
        assert_eq!(images[2].source, "c.png");
    }

    #[test]
    fn test_navigation_entries() {
        let dom = parse_html(
            r#"<nav><ul>
                <li><a href="intro.html">Introduction</a></li>
                <li class="current"><a href="ch1.html">Chapter 1</a></li>
                <li><a href="x.html">Go</a></li>
                <li><a class="active" href="ch2.html">Chapter 2</a></li>
            </ul></nav>
            <ul><li>Not navigation</li></ul>"#,
        );
        let nav = navigation(&dom, &rules());
        let summary: Vec<_> = nav
            .iter()
            .map(|n| (n.text.as_str(), n.link.as_str(), n.is_active))
            .collect();
        assert_eq!(
            summary,
            [
                ("Introduction", "intro.html", false),
                ("Chapter 1", "ch1.html", true),
                ("Chapter 2", "ch2.html", true),
            ]
        );
    }

    #[test]
    fn test_interactions() {
        let long = "x".repeat(200);
        let html = format!(
            r#"<button onclick="goNext()">Next</button>
            <button></button>
            <input type="submit" value="Submit answers">
            <a href="javascript:void(0)" class="btn-primary">Open glossary</a>
            <div class="clickable-card" onclick="{long}"><span class="btn">Inner</span> Card</div>"#
        );
        let dom = parse_html(&html);
        let found = interactions(&dom, &rules());

        assert_eq!(found.len(), 5);
        assert_eq!(found[0].kind, InteractionKind::Button);
        assert_eq!(found[0].action.as_deref(), Some("goNext()"));
        assert_eq!(found[1].kind, InteractionKind::Input);
        assert_eq!(found[1].text, "Submit answers");
        assert_eq!(found[2].kind, InteractionKind::Link);
        assert_eq!(found[2].action.as_deref(), Some("javascript:void(0)"));
        // A card with its own handler stays, and so does the badge inside it.
        assert_eq!(found[3].kind, InteractionKind::Element);
        assert_eq!(found[3].text, "Inner Card");
        let action = found[3].action.as_deref().unwrap();
        assert_eq!(action.len(), 123);
        assert!(action.ends_with("..."));
        assert_eq!(found[4].text, "Inner");
        assert_eq!(found[4].action, None);
    }

    #[test]
    fn test_class_wrapper_does_not_swallow_buttons() {
        let dom = parse_html(
            r#"<div class="interactive-panel"><button onclick="a()">Back</button><button onclick="b()">Next</button></div>
            <div class="interactive-note">Tap to reveal</div>"#,
        );
        let found: Vec<_> = interactions(&dom, &rules())
            .into_iter()
            .map(|i| (i.kind, i.text, i.action))
            .collect();
        assert_eq!(
            found,
            [
                (InteractionKind::Button, "Back".to_string(), Some("a()".to_string())),
                (InteractionKind::Button, "Next".to_string(), Some("b()".to_string())),
                (InteractionKind::Element, "Tap to reveal".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_sources_kept_as_written() {
        let dom = parse_html(r#"<img src=" img/a.png "><a href=" page.html ">Page</a>"#);
        let images = images(&dom, &rules());
        assert_eq!(images[0].1.source, " img/a.png ");
        assert_eq!(links(&dom, &rules())[0].url, " page.html ");
    }

    #[test]
    fn test_links_need_text() {
        let dom = parse_html(r#"<a href="a.html">A page</a><a href="b.html"> </a><a>no href</a>"#);
        assert_eq!(
            links(&dom, &rules()),
            [Link { url: "a.html".into(), text: "A page".into() }]
        );
    }
}
