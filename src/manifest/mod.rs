//! SCORM manifest model.
//!
//! [`parse_manifest`] turns `imsmanifest.xml` text into a [`CourseManifest`]:
//! the organization/item trees that define course navigation, and the
//! resources those items launch.

mod parser;

pub use parser::parse_manifest;

use serde::Serialize;

/// Typed view of one `imsmanifest.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CourseManifest {
    pub identifier: String,
    pub version: String,
    /// `metadata/schema`, e.g. "ADL SCORM".
    pub schema: String,
    /// `metadata/schemaversion`, else the root `schemaversion` or
    /// `xsi:schemaLocation` attribute.
    pub schema_version: String,
    /// `organizations@default`.
    pub default_organization: String,
    pub organizations: Vec<OrganizationNode>,
    pub resources: Vec<ResourceEntry>,
}

impl CourseManifest {
    /// Course title: the first organization with a non-empty title.
    pub fn title(&self) -> &str {
        self.organizations
            .iter()
            .map(|org| org.title.as_str())
            .find(|title| !title.is_empty())
            .unwrap_or("")
    }

    /// Look up a resource by identifier.
    pub fn resource(&self, identifier: &str) -> Option<&ResourceEntry> {
        self.resources.iter().find(|r| r.identifier == identifier)
    }

    /// Total number of items across all organizations.
    pub fn item_count(&self) -> usize {
        self.organizations.iter().map(|org| org.item_count()).sum()
    }
}

/// One `<organization>`: a named navigation tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizationNode {
    pub identifier: String,
    pub title: String,
    /// Top-level items only; nested items hang off their parents.
    pub items: Vec<ItemNode>,
}

impl OrganizationNode {
    /// Items in depth-first order, parents before children.
    pub fn walk(&self) -> Vec<&ItemNode> {
        let mut out = Vec::new();
        for item in &self.items {
            item.collect_depth_first(&mut out);
        }
        out
    }

    pub fn item_count(&self) -> usize {
        self.items.iter().map(ItemNode::subtree_size).sum()
    }
}

/// One `<item>` in an organization tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemNode {
    pub identifier: String,
    /// Resource identifier this item launches; empty for pure folders.
    pub identifierref: String,
    pub title: String,
    /// Distance from the organization; top-level items are 0.
    pub depth: usize,
    pub children: Vec<ItemNode>,
}

impl ItemNode {
    fn collect_depth_first<'a>(&'a self, out: &mut Vec<&'a ItemNode>) {
        out.push(self);
        for child in &self.children {
            child.collect_depth_first(out);
        }
    }

    /// This item plus all its descendants.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(ItemNode::subtree_size).sum::<usize>()
    }
}

/// One `<resource>`: a launchable unit and its files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// `adlcp:scormType` ("sco" / "asset"), empty when absent.
    pub scorm_type: String,
    /// Launch file, relative to the package root.
    pub href: String,
    /// `file@href` values in document order.
    pub files: Vec<String>,
    /// `dependency@identifierref` values in document order.
    pub dependencies: Vec<String>,
}
