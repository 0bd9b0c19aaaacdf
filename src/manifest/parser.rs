//! Streaming `imsmanifest.xml` parser.
//!
//! Item trees are built with an explicit stack of open elements: an item is
//! attached to the item (or organization) that is literally its parent in
//! markup, never to an ancestor further up, so nested items cannot be
//! double-counted.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{CourseManifest, ItemNode, OrganizationNode, ResourceEntry};
use crate::error::{Error, Result};
use crate::util::collapse_whitespace;

/// Parse manifest XML into a [`CourseManifest`].
///
/// Missing attributes become empty strings. A document whose root element is
/// not `manifest` yields an empty model; malformed XML is an error.
pub fn parse_manifest(content: &str) -> Result<CourseManifest> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = Reader::from_str(content);

    let mut state = ParseState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => state.open(&e),
            Ok(Event::Empty(e)) => {
                state.open(&e);
                state.close();
            }
            Ok(Event::End(_)) => state.close(),
            Ok(Event::Text(e)) => state.push_text(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::CData(e)) => state.push_text(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    state.push_text(&resolved);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::ManifestParse {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                });
            }
            _ => {}
        }
    }

    if let Some(open) = state.elements.last() {
        return Err(Error::ManifestParse {
            position: reader.buffer_position() as u64,
            message: format!(
                "unclosed element <{}>",
                String::from_utf8_lossy(&open.name)
            ),
        });
    }

    Ok(state.manifest)
}

/// What an open element contributes to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Other,
    Root,
    Organization,
    Item,
    Resource,
    Capture(Capture),
}

/// Text-bearing elements whose content is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    OrganizationTitle,
    ItemTitle,
    Schema,
    SchemaVersion,
}

struct OpenElement {
    name: Vec<u8>,
    role: Role,
}

#[derive(Default)]
struct ParseState {
    manifest: CourseManifest,
    elements: Vec<OpenElement>,
    is_manifest: bool,
    organization: Option<OrganizationNode>,
    /// Open items, outermost first.
    items: Vec<ItemNode>,
    resource: Option<ResourceEntry>,
    text: Option<String>,
}

impl ParseState {
    fn open(&mut self, e: &BytesStart<'_>) {
        let name = e.name();
        let local = local_name(name.as_ref()).to_vec();
        let role = self.role_for(&local, e);
        self.elements.push(OpenElement { name: local, role });
    }

    fn role_for(&mut self, local: &[u8], e: &BytesStart<'_>) -> Role {
        if self.elements.is_empty() {
            if local != b"manifest" {
                return Role::Other;
            }
            self.is_manifest = true;
            for (key, value) in attributes(e) {
                match key.as_str() {
                    "identifier" => self.manifest.identifier = value,
                    "version" => self.manifest.version = value,
                    "schemaversion" if self.manifest.schema_version.is_empty() => {
                        self.manifest.schema_version = value
                    }
                    "schemaLocation" if self.manifest.schema_version.is_empty() => {
                        self.manifest.schema_version = value
                    }
                    _ => {}
                }
            }
            return Role::Root;
        }

        if !self.is_manifest {
            return Role::Other;
        }

        let (parent_role, parent_is_metadata) = self
            .elements
            .last()
            .map(|p| (p.role, p.name == b"metadata"))
            .unwrap_or((Role::Other, false));
        let in_root_metadata = parent_is_metadata && self.elements.len() == 2;

        match local {
            b"organizations" => {
                if let Some(default) = attribute(e, "default") {
                    self.manifest.default_organization = default;
                }
                Role::Other
            }
            b"organization" if self.organization.is_none() => {
                self.organization = Some(OrganizationNode {
                    identifier: attribute(e, "identifier").unwrap_or_default(),
                    ..Default::default()
                });
                Role::Organization
            }
            b"item" if matches!(parent_role, Role::Organization | Role::Item) => {
                self.items.push(ItemNode {
                    identifier: attribute(e, "identifier").unwrap_or_default(),
                    identifierref: attribute(e, "identifierref").unwrap_or_default(),
                    depth: self.items.len(),
                    ..Default::default()
                });
                Role::Item
            }
            b"title" if parent_role == Role::Organization => {
                self.start_capture(Capture::OrganizationTitle)
            }
            b"title" if parent_role == Role::Item => self.start_capture(Capture::ItemTitle),
            b"schema" if in_root_metadata => self.start_capture(Capture::Schema),
            b"schemaversion" if in_root_metadata => self.start_capture(Capture::SchemaVersion),
            b"resource" if self.resource.is_none() => {
                let mut resource = ResourceEntry::default();
                for (key, value) in attributes(e) {
                    match key.as_str() {
                        "identifier" => resource.identifier = value,
                        "type" => resource.kind = value,
                        "href" => resource.href = value,
                        "scormType" | "scormtype" => resource.scorm_type = value,
                        _ => {}
                    }
                }
                self.resource = Some(resource);
                Role::Resource
            }
            b"file" if parent_role == Role::Resource => {
                if let Some(resource) = self.resource.as_mut() {
                    resource
                        .files
                        .push(attribute(e, "href").unwrap_or_default());
                }
                Role::Other
            }
            b"dependency" if parent_role == Role::Resource => {
                if let Some(resource) = self.resource.as_mut()
                    && let Some(target) = attribute(e, "identifierref")
                {
                    resource.dependencies.push(target);
                }
                Role::Other
            }
            _ => Role::Other,
        }
    }

    fn start_capture(&mut self, capture: Capture) -> Role {
        self.text = Some(String::new());
        Role::Capture(capture)
    }

    fn push_text(&mut self, text: &str) {
        if let Some(buf) = self.text.as_mut() {
            buf.push_str(text);
        }
    }

    fn close(&mut self) {
        let Some(element) = self.elements.pop() else {
            return;
        };

        match element.role {
            Role::Capture(capture) => {
                let text = collapse_whitespace(&self.text.take().unwrap_or_default());
                self.finish_capture(capture, text);
            }
            Role::Item => {
                if let Some(item) = self.items.pop() {
                    if let Some(parent) = self.items.last_mut() {
                        parent.children.push(item);
                    } else if let Some(org) = self.organization.as_mut() {
                        org.items.push(item);
                    }
                }
            }
            Role::Organization => {
                if let Some(org) = self.organization.take() {
                    self.manifest.organizations.push(org);
                }
            }
            Role::Resource => {
                if let Some(resource) = self.resource.take() {
                    self.manifest.resources.push(resource);
                }
            }
            Role::Root | Role::Other => {}
        }
    }

    fn finish_capture(&mut self, capture: Capture, text: String) {
        let target = match capture {
            Capture::OrganizationTitle => self.organization.as_mut().map(|org| &mut org.title),
            Capture::ItemTitle => self.items.last_mut().map(|item| &mut item.title),
            Capture::Schema => Some(&mut self.manifest.schema),
            Capture::SchemaVersion => Some(&mut self.manifest.schema_version),
        };
        // First title wins; metadata schemaversion overrides root attributes.
        if let Some(slot) = target
            && (slot.is_empty() || capture == Capture::SchemaVersion)
            && !text.is_empty()
        {
            *slot = text;
        }
    }
}

/// All attributes of an element as `(local name, decoded value)` pairs.
fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).into_owned();
            (key, decode_attribute(&attr.value))
        })
        .collect()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Option<String> {
    attributes(e)
        .into_iter()
        .find_map(|(key, value)| (key == name).then_some(value))
}

/// Decode raw attribute bytes, expanding entity references.
fn decode_attribute(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    if !text.contains('&') {
        return text.into_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_ref();
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';').and_then(|semi| {
            resolve_entity(&after[..semi]).map(|resolved| (resolved, semi))
        }) {
            Some((resolved, semi)) => {
                out.push_str(&resolved);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Extract local name from a namespaced XML name (e.g., "adlcp:scormType" -> "scormType").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve predefined and numeric XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}
