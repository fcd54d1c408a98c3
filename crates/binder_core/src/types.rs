use crate::sniff::sniff_media_type;

pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// One entry of a series listing, as reported by the listing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMeta {
    pub title: String,
    /// Site-relative path of the chapter's read page.
    pub read_page_url: String,
    /// Publication date in display form, e.g. `Jan 5, 2023`.
    pub published: String,
}

/// Raw markup pulled out of a rendered chapter page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMarkup {
    pub heading_html: String,
    pub content_html: String,
}

/// Generated XHTML for one accepted chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDocument {
    pub title: String,
    /// 1-based position of the chapter in the series listing.
    pub sequence: u32,
    pub xhtml: String,
}

impl ContentDocument {
    pub fn file_name(&self) -> String {
        format!("Chapter{}.xhtml", self.sequence)
    }

    pub fn archive_path(&self) -> String {
        format!("OEBPS/Text/{}", self.file_name())
    }
}

/// A binary resource (an image) lifted out of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedResource {
    pub id: String,
    /// Path relative to `OEBPS/`.
    pub path: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ExtractedResource {
    /// Builds the `counter`-th resource of chapter `sequence`, sniffing its type.
    pub fn new(sequence: u32, counter: u32, bytes: Vec<u8>) -> Self {
        Self {
            id: format!("ch{sequence}img{counter}"),
            path: format!("Images/ch{sequence}_img{counter}"),
            media_type: sniff_media_type(&bytes).as_str().to_string(),
            bytes,
        }
    }

    /// Reference used from inside a chapter document (which lives in `Text/`).
    pub fn document_href(&self) -> String {
        format!("../{}", self.path)
    }

    pub fn archive_path(&self) -> String {
        format!("OEBPS/{}", self.path)
    }

    pub fn manifest_item(&self) -> ManifestItem {
        ManifestItem {
            id: self.id.clone(),
            href: self.path.clone(),
            media_type: self.media_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
}
