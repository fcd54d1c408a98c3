//! Package document (content.opf) and navigation document (toc.ncx).
//!
//! Both documents number chapters by their position among accepted chapters,
//! starting at 1; a chapter skipped earlier leaves no gap.

use chrono::NaiveDate;

use crate::escape::escape_xml;
use crate::types::{ManifestItem, XHTML_MEDIA_TYPE};

pub const NCX_ID: &str = "ncx";
pub const NCX_HREF: &str = "toc.ncx";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Book-level metadata shared by content.opf and toc.ncx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub author: String,
    /// Stable identifier (the series slug), used as both `BookId` and `dtb:uid`.
    pub identifier: String,
    pub title: String,
    pub language: String,
    pub modified: NaiveDate,
}

/// An accepted chapter as seen by the package documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub title: String,
    /// File name under `Text/`.
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDocuments {
    pub content_opf: String,
    pub toc_ncx: String,
}

pub fn generate(
    metadata: &PackageMetadata,
    chapters: &[ChapterEntry],
    resources: &[ManifestItem],
) -> PackageDocuments {
    PackageDocuments {
        content_opf: content_opf(metadata, chapters, resources),
        toc_ncx: toc_ncx(metadata, chapters),
    }
}

fn chapter_id(number: usize) -> String {
    format!("Chapter{number}")
}

pub fn content_opf(
    metadata: &PackageMetadata,
    chapters: &[ChapterEntry],
    resources: &[ManifestItem],
) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package version="2.0" unique-identifier="BookId" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
"#,
    );
    opf.push_str(&format!(
        "    <dc:creator>{}</dc:creator>\n",
        escape_xml(&metadata.author)
    ));
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">{}</dc:identifier>\n",
        escape_xml(&metadata.identifier)
    ));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        escape_xml(&metadata.language)
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(&metadata.title)
    ));
    opf.push_str(&format!(
        "    <dc:date opf:event=\"modification\">{}</dc:date>\n",
        metadata.modified.format("%Y-%m-%d")
    ));
    opf.push_str("  </metadata>\n  <manifest>\n");

    for (index, chapter) in chapters.iter().enumerate() {
        push_item(
            &mut opf,
            &chapter_id(index + 1),
            &format!("Text/{}", chapter.file_name),
            XHTML_MEDIA_TYPE,
        );
    }
    for item in resources {
        push_item(&mut opf, &item.id, &item.href, &item.media_type);
    }
    push_item(&mut opf, NCX_ID, NCX_HREF, NCX_MEDIA_TYPE);

    opf.push_str("  </manifest>\n");
    opf.push_str(&format!("  <spine toc=\"{NCX_ID}\">\n"));
    for number in 1..=chapters.len() {
        opf.push_str(&format!(
            "    <itemref idref=\"{}\"/>\n",
            chapter_id(number)
        ));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn push_item(opf: &mut String, id: &str, href: &str, media_type: &str) {
    opf.push_str(&format!(
        "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
        escape_xml(id),
        escape_xml(href),
        escape_xml(media_type)
    ));
}

pub fn toc_ncx(metadata: &PackageMetadata, chapters: &[ChapterEntry]) -> String {
    let mut ncx = String::new();

    ncx.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx version="2005-1" xml:lang="{lang}" xmlns="http://www.daisy.org/z3986/2005/ncx/">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle><text>{title}</text></docTitle>
  <docAuthor><text>{author}</text></docAuthor>
  <navMap>
"#,
        lang = escape_xml(&metadata.language),
        uid = escape_xml(&metadata.identifier),
        title = escape_xml(&metadata.title),
        author = escape_xml(&metadata.author),
    ));

    for (index, chapter) in chapters.iter().enumerate() {
        let number = index + 1;
        ncx.push_str(&format!(
            "    <navPoint id=\"{id}\" playOrder=\"{number}\">\n      <navLabel><text>{label}</text></navLabel>\n      <content src=\"Text/{src}\"/>\n    </navPoint>\n",
            id = chapter_id(number),
            label = escape_xml(&chapter.title),
            src = escape_xml(&chapter.file_name),
        ));
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}
