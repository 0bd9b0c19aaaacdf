//! Arena-allocated HTML tree.
//!
//! Nodes live in one vector and link to each other by index, so parent
//! identity is a cheap comparison and traversals never fight the borrow
//! checker. Node ids are assigned in creation order, which for parsed pages
//! is not necessarily document order; use [`PageDom::descendants`] for that.

use html5ever::QualName;

use crate::util::collapse_whitespace;

/// Elements whose text never reaches extracted content.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that separate words when their text is concatenated.
const BLOCK_TAGS: [&str; 28] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li",
    "option", "p", "section", "td", "th", "tr",
];

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel for "no node".
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-split `class` attribute.
        classes: Vec<String>,
    },
    Text(String),
    Comment,
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node and its tree links.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Parsed page. Read-only once the tree sink has finished.
pub struct PageDom {
    nodes: Vec<Node>,
    document: NodeId,
}

impl PageDom {
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        dom.document = dom.alloc(Node::new(NodeData::Document));
        dom
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // ------------------------------------------------------------------
    // Construction (used by the tree sink)
    // ------------------------------------------------------------------

    pub(crate) fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let classes = attrs
            .iter()
            .find(|a| a.name.local.as_ref() == "class")
            .map(|a| a.value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            classes,
        }))
    }

    pub(crate) fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    pub(crate) fn create_comment(&mut self) -> NodeId {
        self.alloc(Node::new(NodeData::Comment))
    }

    /// Append `child` as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` immediately before `sibling`.
    pub(crate) fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text, merging into a trailing text node when possible.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(existing) = &mut last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Unlink a node from its parent and siblings.
    pub(crate) fn detach(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Direct children of a node.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            dom: self,
            current: self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE),
        }
    }

    /// Element children of a node.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    /// All descendants of `root` in document (pre-)order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// Parent chain, nearest first, stopping before the document node.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
            .take_while(move |&p| p != self.document)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(NodeId::is_some)
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// First descendant element with the given tag.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.document)
            .find(|&id| self.tag(id).is_some_and(|t| t == tag))
    }

    /// The `<body>` element, or the document when there is none.
    pub fn body(&self) -> NodeId {
        self.find_by_tag("body").unwrap_or(self.document)
    }

    // ------------------------------------------------------------------
    // Element accessors
    // ------------------------------------------------------------------

    /// Local tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        })
    }

    pub fn has_tag(&self, id: NodeId, tags: &[&str]) -> bool {
        self.tag(id).is_some_and(|t| tags.contains(&t))
    }

    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Attribute value, trimmed, `None` when absent or blank.
    pub fn non_empty_attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attr(id, attr_name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn classes(&self, id: NodeId) -> &[String] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Whether any ancestor of `id` has one of `tags`.
    pub fn has_ancestor_tag(&self, id: NodeId, tags: &[&str]) -> bool {
        self.ancestors(id).any(|a| self.has_tag(a, tags))
    }

    /// Visible text of a subtree, whitespace collapsed and trimmed.
    ///
    /// Script-like subtrees are skipped; block elements separate words.
    pub fn text(&self, id: NodeId) -> String {
        let mut raw = String::new();
        self.collect_text(id, &mut raw);
        collapse_whitespace(&raw)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element { name, .. }) => {
                let tag = name.local.as_ref();
                if HIDDEN_TAGS.contains(&tag) {
                    return;
                }
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    out.push(' ');
                }
                for child in self.children(id) {
                    self.collect_text(child, out);
                }
                if block {
                    out.push(' ');
                }
            }
            Some(NodeData::Document) => {
                for child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            Some(NodeData::Comment) | None => {}
        }
    }

    /// Raw content of a text node.
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

impl Default for PageDom {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    dom: &'a PageDom,
    current: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self.dom.get(id).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    dom: &'a PageDom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(self.dom.children(id));
        self.stack[start..].reverse();
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use html5ever::{LocalName, ns};

    use super::*;

    fn qname(local: &str) -> QualName {
        QualName::new(None, ns!(html), LocalName::from(local))
    }

    fn element(dom: &mut PageDom, tag: &str, class: Option<&str>) -> NodeId {
        let attrs = class
            .map(|c| {
                vec![Attribute {
                    name: qname("class"),
                    value: c.to_string(),
                }]
            })
            .unwrap_or_default();
        dom.create_element(qname(tag), attrs)
    }

    #[test]
    fn test_classes_are_split() {
        let mut dom = PageDom::new();
        let div = element(&mut dom, "div", Some(" lesson  active "));
        assert_eq!(dom.classes(div), ["lesson", "active"]);
        assert_eq!(dom.tag(div), Some("div"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut dom = PageDom::new();
        let root = element(&mut dom, "div", None);
        let a = element(&mut dom, "p", None);
        let b = element(&mut dom, "p", None);
        let a1 = element(&mut dom, "span", None);
        dom.append(dom.document(), root);
        dom.append(root, a);
        dom.append(root, b);
        dom.append(a, a1);

        let order: Vec<_> = dom.descendants(root).collect();
        assert_eq!(order, [a, a1, b]);
        assert!(dom.is_ancestor(root, a1));
        assert!(!dom.is_ancestor(b, a1));
        assert_eq!(dom.ancestors(a1).collect::<Vec<_>>(), [a, root]);
    }

    #[test]
    fn test_text_merging() {
        let mut dom = PageDom::new();
        let p = element(&mut dom, "p", None);
        dom.append(dom.document(), p);
        dom.append_text(p, "Hello, ");
        dom.append_text(p, "World!");

        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(dom.text_content(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_insert_before_and_detach() {
        let mut dom = PageDom::new();
        let ul = element(&mut dom, "ul", None);
        let first = element(&mut dom, "li", None);
        let second = element(&mut dom, "li", None);
        dom.append(dom.document(), ul);
        dom.append(ul, second);
        dom.insert_before(second, first);
        assert_eq!(dom.children(ul).collect::<Vec<_>>(), [first, second]);

        dom.detach(first);
        assert_eq!(dom.children(ul).collect::<Vec<_>>(), [second]);
        assert_eq!(dom.parent(first), None);
    }
}
