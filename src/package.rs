//! Course package access: the extracted file set of a SCORM zip.
//!
//! A [`Package`] is an ordered map from entry path to raw bytes. Paths use
//! forward slashes, keep their original casing, and appear in archive order
//! (the "file-set order" every later stage preserves).

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use zip::ZipArchive;

use crate::error::Result;
use crate::util::{decode_entry, detect_image_format, extension};

/// Canonical manifest entry names, tried before a case-insensitive scan.
const MANIFEST_NAMES: [&str; 2] = ["imsmanifest.xml", "IMSMANIFEST.XML"];

/// One file extracted from the package.
#[derive(Debug, Clone)]
pub struct PackageFile {
    pub path: String,
    pub data: Arc<[u8]>,
}

impl PackageFile {
    /// UTF-8 view of the file (see [`crate::util::decode_text`]).
    pub fn text(&self) -> Cow<'_, str> {
        decode_entry(&self.data)
    }

    pub fn class(&self) -> FileClass {
        FileClass::of(&self.path, &self.data)
    }
}

/// Coarse file classification used by the technical summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileClass {
    Html,
    Image,
    Stylesheet,
    Script,
    Xml,
    Other,
}

impl FileClass {
    pub fn of(path: &str, data: &[u8]) -> Self {
        match extension(path).as_deref() {
            Some("html" | "htm" | "xhtml") => FileClass::Html,
            Some("css") => FileClass::Stylesheet,
            Some("js" | "mjs") => FileClass::Script,
            Some("xml" | "xsd" | "dtd") => FileClass::Xml,
            _ if detect_image_format(path, data).is_some() => FileClass::Image,
            _ => FileClass::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileClass::Html => "HTML",
            FileClass::Image => "Image",
            FileClass::Stylesheet => "CSS",
            FileClass::Script => "Script",
            FileClass::Xml => "XML",
            FileClass::Other => "Other",
        }
    }

    /// Whether raw dumps of this class are readable text.
    pub fn is_text(self, data: &[u8]) -> bool {
        match self {
            FileClass::Image => false,
            FileClass::Other => looks_like_text(data),
            _ => true,
        }
    }
}

/// Heuristic: no NUL bytes in the first kilobyte.
fn looks_like_text(data: &[u8]) -> bool {
    !data.iter().take(1024).any(|&b| b == 0)
}

/// The extracted file set of one course package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    files: Vec<PackageFile>,
    index: HashMap<String, usize>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a zip package from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a zip package held in memory.
    pub fn from_zip_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Read a zip package from any [`Read`] + [`Seek`] source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut package = Package::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let path = entry.name().replace('\\', "/");
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            package.insert(path, contents);
        }

        debug!(entries = package.len(), "read package archive");
        Ok(package)
    }

    /// Add or replace an entry. Replacing keeps the original position.
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Arc<[u8]>>) {
        let path = path.into();
        let data = data.into();
        match self.index.get(&path) {
            Some(&i) => self.files[i].data = data,
            None => {
                self.index.insert(path.clone(), self.files.len());
                self.files.push(PackageFile { path, data });
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&PackageFile> {
        self.index.get(path).map(|&i| &self.files[i])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Entries in file-set order.
    pub fn files(&self) -> &[PackageFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Locate the manifest entry at the package root.
    pub fn manifest(&self) -> Option<&PackageFile> {
        MANIFEST_NAMES
            .iter()
            .find_map(|name| self.get(name))
            .or_else(|| {
                self.files
                    .iter()
                    .find(|f| f.path.eq_ignore_ascii_case(MANIFEST_NAMES[0]))
            })
    }

    /// HTML entries in file-set order.
    pub fn html_files(&self) -> impl Iterator<Item = &PackageFile> {
        self.files
            .iter()
            .filter(|f| FileClass::of(&f.path, &f.data) == FileClass::Html)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, options).unwrap();
            } else {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_reads_entries_in_archive_order() {
        let bytes = zip_of(&[
            ("imsmanifest.xml", b"<manifest/>"),
            ("content/", b""),
            ("content/Page1.html", b"<p>one</p>"),
            ("content/img/pic.png", b"\x89PNG"),
        ]);
        let package = Package::from_zip_bytes(&bytes).unwrap();

        let paths: Vec<_> = package.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            ["imsmanifest.xml", "content/Page1.html", "content/img/pic.png"]
        );
        assert_eq!(&*package.get("content/Page1.html").unwrap().data, b"<p>one</p>");
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::from_zip_bytes(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, crate::Error::ArchiveRead(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_manifest_lookup_variants() {
        let mut package = Package::new();
        package.insert("IMSMANIFEST.XML", b"<manifest/>".to_vec());
        assert_eq!(package.manifest().unwrap().path, "IMSMANIFEST.XML");

        let mut package = Package::new();
        package.insert("ImsManifest.xml", b"<manifest/>".to_vec());
        assert_eq!(package.manifest().unwrap().path, "ImsManifest.xml");

        let mut package = Package::new();
        package.insert("course/imsmanifest.xml", b"<manifest/>".to_vec());
        assert!(package.manifest().is_none());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut package = Package::new();
        package.insert("a.html", b"1".to_vec());
        package.insert("b.html", b"2".to_vec());
        package.insert("a.html", b"3".to_vec());
        assert_eq!(package.len(), 2);
        assert_eq!(package.files()[0].path, "a.html");
        assert_eq!(&*package.files()[0].data, b"3");
    }

    #[test]
    fn test_file_classes() {
        assert_eq!(FileClass::of("index.HTML", b""), FileClass::Html);
        assert_eq!(FileClass::of("s/site.css", b""), FileClass::Stylesheet);
        assert_eq!(FileClass::of("s/app.js", b""), FileClass::Script);
        assert_eq!(FileClass::of("imsmanifest.xml", b""), FileClass::Xml);
        assert_eq!(FileClass::of("pic.jpg", b""), FileClass::Image);
        assert_eq!(FileClass::of("blob", b"\x89PNG\r\n"), FileClass::Image);
        assert_eq!(FileClass::of("notes.txt", b"hi"), FileClass::Other);
        assert!(FileClass::Other.is_text(b"plain"));
        assert!(!FileClass::Other.is_text(b"bin\0ary"));
        assert!(!FileClass::Image.is_text(b"whatever"));
    }

    #[test]
    fn test_html_files_filter() {
        let mut package = Package::new();
        package.insert("imsmanifest.xml", b"<manifest/>".to_vec());
        package.insert("b.htm", b"".to_vec());
        package.insert("pic.png", b"".to_vec());
        package.insert("a.html", b"".to_vec());
        let html: Vec<_> = package.html_files().map(|f| f.path.as_str()).collect();
        assert_eq!(html, ["b.htm", "a.html"]);
    }
}
