//! Fixed container files and archive entry ordering.
//!
//! EPUB readers locate the `mimetype` entry by offset, so it must be the
//! first entry of the zip and must be stored without compression.

use std::collections::HashSet;

use binder_logging::binder_warn;

pub const MIMETYPE_PATH: &str = "mimetype";
pub const MIMETYPE_CONTENT: &str = "application/epub+zip\n";
pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
    <rootfiles>
        <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
   </rootfiles>
</container>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Stored,
    Deflated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
    pub compression: Compression,
}

/// Ordered archive contents. Always starts with `mimetype` followed by
/// `META-INF/container.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpubArchive {
    entries: Vec<ArchiveEntry>,
    paths: HashSet<String>,
}

impl EpubArchive {
    pub fn new() -> Self {
        let mut archive = Self {
            entries: Vec::new(),
            paths: HashSet::new(),
        };
        archive.insert(MIMETYPE_PATH.to_string(), MIMETYPE_CONTENT.into(), Compression::Stored);
        archive.insert(
            CONTAINER_PATH.to_string(),
            CONTAINER_XML.into(),
            Compression::Deflated,
        );
        archive
    }

    /// Append a compressed entry. Paths already present are left untouched.
    pub fn push(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> bool {
        self.insert(path.into(), bytes.into(), Compression::Deflated)
    }

    fn insert(&mut self, path: String, bytes: Vec<u8>, compression: Compression) -> bool {
        if !self.paths.insert(path.clone()) {
            binder_warn!("duplicate archive entry {} ignored", path);
            return false;
        }
        self.entries.push(ArchiveEntry {
            path,
            bytes,
            compression,
        });
        true
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn get(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: the fixed container files are always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EpubArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_files_lead_the_archive() {
        let archive = EpubArchive::new();
        let paths: Vec<_> = archive.paths().collect();
        assert_eq!(paths, vec![MIMETYPE_PATH, CONTAINER_PATH]);
        assert_eq!(archive.entries()[0].compression, Compression::Stored);
        assert_eq!(archive.entries()[0].bytes, b"application/epub+zip\n");
    }

    #[test]
    fn mimetype_cannot_be_displaced() {
        let mut archive = EpubArchive::new();
        assert!(!archive.push(MIMETYPE_PATH, "text/plain"));
        assert!(archive.push("OEBPS/toc.ncx", "<ncx/>"));
        assert_eq!(archive.len(), 3);
        assert_eq!(archive.entries()[0].path, MIMETYPE_PATH);
        assert_eq!(archive.get(MIMETYPE_PATH).unwrap().bytes, MIMETYPE_CONTENT.as_bytes());
    }
}
