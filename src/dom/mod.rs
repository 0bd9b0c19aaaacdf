//! Tree-queryable HTML documents.
//!
//! Pages are parsed with html5ever into an arena ([`PageDom`]) and queried
//! with CSS selectors ([`SelectorRule`]). The tree is never mutated after
//! parsing, so every query observes the page exactly as authored.

mod arena;
mod selector;
mod tree_sink;

pub use arena::{Attribute, Children, Descendants, Node, NodeData, NodeId, PageDom};
pub use selector::{ElementRef, PageSelectors, SelectorRule};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::PageSink;

/// Parse an HTML page into a [`PageDom`].
///
/// Never fails: html5ever recovers from any malformed input the way a
/// browser would.
pub fn parse_html(html: &str) -> PageDom {
    parse_document(PageSink::new(), ParseOpts::default())
        .one(html)
        .into_dom()
}
