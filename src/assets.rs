//! Image reference resolution against the package file set.
//!
//! Course pages reference images every way imaginable: relative to the
//! page, relative to the package root, with stray `./` or `/` prefixes, or
//! by a path that no longer exists but whose file name still does. The
//! resolver tries, in order:
//!
//! 1. the reference as an exact package path,
//! 2. the reference without a leading `./`,
//! 3. the reference without a leading `/`,
//! 4. the reference joined onto the referring page's directory,
//! 5. the first entry (in file-set order) with the same final segment.
//!
//! Unresolved images are kept; renderers draw a placeholder for them.

use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::extract::{ExtractedContent, ImageRef};
use crate::package::Package;
use crate::util::{extract_image_dimensions, file_name, join_path, parent_dir};

/// Which resolution step matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveRule {
    Exact,
    DotSlash,
    Rooted,
    Relative,
    Basename,
}

/// A reference resolved to a package entry.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub path: String,
    pub data: Arc<[u8]>,
    pub rule: ResolveRule,
}

/// Resolve `reference`, found on the page at `page_path`.
pub fn resolve(package: &Package, page_path: &str, reference: &str) -> Option<Resolution> {
    let reference = reference.trim();
    if reference.is_empty() || is_external(reference) {
        return None;
    }

    let clean = strip_query_and_fragment(reference);
    let mut variants: Vec<Cow<'_, str>> = vec![Cow::Borrowed(clean)];
    if let Ok(decoded) = percent_encoding::percent_decode_str(clean).decode_utf8()
        && decoded != clean
    {
        variants.push(Cow::Owned(decoded.into_owned()));
    }

    let lookup = |path: &str, rule: ResolveRule| {
        package.get(path).map(|file| Resolution {
            path: file.path.clone(),
            data: Arc::clone(&file.data),
            rule,
        })
    };

    let base_dir = parent_dir(page_path);
    for rule in [
        ResolveRule::Exact,
        ResolveRule::DotSlash,
        ResolveRule::Rooted,
        ResolveRule::Relative,
    ] {
        for variant in &variants {
            if let Some(found) = candidate(rule, variant, base_dir).and_then(|path| lookup(&path, rule)) {
                return Some(found);
            }
        }
    }

    variants.iter().find_map(|variant| {
        let name = file_name(variant);
        if name.is_empty() {
            return None;
        }
        package
            .files()
            .iter()
            .find(|f| f.path == name || f.path.strip_suffix(name).is_some_and(|dir| dir.ends_with('/')))
            .and_then(|f| lookup(&f.path, ResolveRule::Basename))
    })
}

/// Package path to try for `reference` under a path-shaped rule.
fn candidate(rule: ResolveRule, reference: &str, base_dir: &str) -> Option<String> {
    match rule {
        ResolveRule::Exact => Some(reference.to_string()),
        ResolveRule::DotSlash => reference.strip_prefix("./").map(str::to_string),
        ResolveRule::Rooted => reference.strip_prefix('/').map(str::to_string),
        ResolveRule::Relative => Some(join_path(base_dir, reference)),
        ResolveRule::Basename => None,
    }
}

/// `data:` URIs and `scheme://` URLs never live in the package.
fn is_external(reference: &str) -> bool {
    let lower = reference.get(..5).map(str::to_ascii_lowercase);
    lower.as_deref() == Some("data:") || reference.starts_with("//") || has_scheme(reference)
}

fn has_scheme(reference: &str) -> bool {
    reference.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn strip_query_and_fragment(reference: &str) -> &str {
    reference
        .find(['?', '#'])
        .map(|i| &reference[..i])
        .unwrap_or(reference)
}

/// Header sniffing first; formats it does not know go through `image`.
fn pixel_size(data: &[u8]) -> Option<(u32, u32)> {
    extract_image_dimensions(data).or_else(|| {
        image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    })
}

/// Resolve one image in place. Returns whether bytes were attached.
pub fn resolve_image(package: &Package, page_path: &str, image: &mut ImageRef) -> bool {
    match resolve(package, page_path, &image.source) {
        Some(found) => {
            debug!(src = %image.source, path = %found.path, rule = ?found.rule, "resolved image");
            image.pixel_size = pixel_size(&found.data);
            image.resolved_path = Some(found.path);
            image.bytes = Some(found.data);
            true
        }
        None => {
            warn!(page = page_path, src = %image.source, "image not found in package");
            image.resolved_path = None;
            image.bytes = None;
            image.pixel_size = None;
            false
        }
    }
}

/// Resolve every image of a page record, page-level and lesson-level.
/// Returns the number of references left unresolved, lesson copies
/// included.
pub fn attach_assets(content: &mut ExtractedContent, package: &Package) -> usize {
    let page_path = content.source_path.clone();
    content
        .images_mut()
        .map(|image| resolve_image(package, &page_path, image))
        .filter(|resolved| !resolved)
        .count()
}
