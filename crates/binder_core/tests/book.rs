use std::sync::Once;

use binder_core::{
    content_opf, toc_ncx, BookBuilder, ChapterEntry, ChapterMarkup, ChapterOutcome,
    ChapterTransformer, Compression, ManifestItem, PackageMetadata, ResourceFetchError,
    ResourceFetcher, SkipReason, CONTAINER_PATH, CONTAINER_XML, MIMETYPE_PATH,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(binder_logging::initialize_for_tests);
}

struct GifFetcher;

impl ResourceFetcher for GifFetcher {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, ResourceFetchError> {
        if reference.ends_with(".gif") {
            Ok(GIF.to_vec())
        } else {
            Err(ResourceFetchError::new(reference, "connection reset"))
        }
    }
}

fn metadata() -> PackageMetadata {
    PackageMetadata {
        author: "ஆசிரியர் & Co".to_string(),
        identifier: "nila-series".to_string(),
        title: "நிலா <1>".to_string(),
        language: "ta".to_string(),
        modified: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
    }
}

fn markup(title: &str, body: &str) -> ChapterMarkup {
    ChapterMarkup {
        heading_html: format!("<h1>{title}</h1>"),
        content_html: body.to_string(),
    }
}

/// Listing [A, B (no content), C] where C carries one image.
fn three_chapter_book() -> BookBuilder {
    let transformer = ChapterTransformer::default();
    let mut book = BookBuilder::new();

    let a = markup("A", "<p>alpha</p>");
    let c = markup("C", r#"<p><img src="/img/c.gif"><img src="/img/broken.png"></p>"#);

    assert_eq!(
        book.record("A", 1, transformer.transform("A", 1, Some(&a), &GifFetcher)),
        Some(1)
    );
    assert_eq!(
        book.record("B", 2, transformer.transform("B", 2, None, &GifFetcher)),
        None
    );
    assert_eq!(
        book.record("C", 3, transformer.transform("C", 3, Some(&c), &GifFetcher)),
        Some(2)
    );
    book
}

#[test]
fn skipped_chapter_leaves_no_gap_in_numbering() {
    init_logging();
    let book = three_chapter_book();

    assert_eq!(book.accepted().len(), 2);
    assert_eq!(book.skipped().len(), 1);
    assert_eq!(book.skipped()[0].sequence, 2);
    assert_eq!(book.skipped()[0].reason, SkipReason::ContentAbsent);
    assert_eq!(book.failed_fetch_count(), 1);
    assert_eq!(
        book.chapter_entries(),
        vec![
            ChapterEntry {
                title: "A".to_string(),
                file_name: "Chapter1.xhtml".to_string(),
            },
            ChapterEntry {
                title: "C".to_string(),
                file_name: "Chapter3.xhtml".to_string(),
            },
        ]
    );

    let opf = content_opf(&metadata(), &book.chapter_entries(), &[]);
    assert!(opf.contains(r#"<itemref idref="Chapter1"/>"#));
    assert!(opf.contains(r#"<itemref idref="Chapter2"/>"#));
    assert!(!opf.contains(r#"idref="Chapter3""#));
    assert!(opf.contains(r#"<item id="Chapter2" href="Text/Chapter3.xhtml""#));

    let ncx = toc_ncx(&metadata(), &book.chapter_entries());
    assert!(ncx.contains(r#"<navPoint id="Chapter2" playOrder="2">"#));
    assert!(ncx.contains(r#"<content src="Text/Chapter3.xhtml"/>"#));
}

#[test]
fn archive_entries_follow_the_container_layout() {
    init_logging();
    let archive = three_chapter_book().finish(&metadata());

    let paths: Vec<_> = archive.paths().collect();
    assert_eq!(
        paths,
        vec![
            MIMETYPE_PATH,
            CONTAINER_PATH,
            "OEBPS/content.opf",
            "OEBPS/toc.ncx",
            "OEBPS/Text/Chapter1.xhtml",
            "OEBPS/Text/Chapter3.xhtml",
            "OEBPS/Images/ch3_img1",
        ]
    );
    assert_eq!(archive.entries()[0].compression, Compression::Stored);
    assert!(archive.entries()[1..]
        .iter()
        .all(|e| e.compression == Compression::Deflated));
    assert_eq!(archive.get(CONTAINER_PATH).unwrap().bytes, CONTAINER_XML.as_bytes());
    assert_eq!(archive.get("OEBPS/Images/ch3_img1").unwrap().bytes, GIF);

    let chapter = String::from_utf8(archive.get("OEBPS/Text/Chapter3.xhtml").unwrap().bytes.clone())
        .unwrap();
    assert!(chapter.contains(r#"<img src="../Images/ch3_img1"/>"#));
    assert!(chapter.contains(r#"<img src="/img/broken.png">"#));

    let opf = String::from_utf8(archive.get("OEBPS/content.opf").unwrap().bytes.clone()).unwrap();
    assert!(opf.contains(r#"<item id="ch3img1" href="Images/ch3_img1" media-type="image/gif"/>"#));
}

#[test]
fn content_opf_matches_expected_document() {
    init_logging();
    let chapters = vec![ChapterEntry {
        title: "One".to_string(),
        file_name: "Chapter1.xhtml".to_string(),
    }];
    let resources = vec![ManifestItem {
        id: "ch1img1".to_string(),
        href: "Images/ch1_img1".to_string(),
        media_type: "image/png".to_string(),
    }];

    let opf = content_opf(&metadata(), &chapters, &resources);

    let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<package version="2.0" unique-identifier="BookId" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:creator>ஆசிரியர் &amp; Co</dc:creator>
    <dc:identifier id="BookId">nila-series</dc:identifier>
    <dc:language>ta</dc:language>
    <dc:title>நிலா &lt;1&gt;</dc:title>
    <dc:date opf:event="modification">2024-03-09</dc:date>
  </metadata>
  <manifest>
    <item id="Chapter1" href="Text/Chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1img1" href="Images/ch1_img1" media-type="image/png"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="Chapter1"/>
  </spine>
</package>
"#;
    assert_eq!(opf, expected);
}

#[test]
fn toc_ncx_escapes_labels_and_titles() {
    init_logging();
    let chapters = vec![ChapterEntry {
        title: "\"Quoted\" & <tagged>".to_string(),
        file_name: "Chapter4.xhtml".to_string(),
    }];

    let ncx = toc_ncx(&metadata(), &chapters);

    assert!(ncx.contains(r#"<meta name="dtb:uid" content="nila-series"/>"#));
    assert!(ncx.contains("<docTitle><text>நிலா &lt;1&gt;</text></docTitle>"));
    assert!(ncx.contains("<docAuthor><text>ஆசிரியர் &amp; Co</text></docAuthor>"));
    assert!(ncx.contains(
        "<navLabel><text>&quot;Quoted&quot; &amp; &lt;tagged&gt;</text></navLabel>"
    ));
    assert!(ncx.contains(r#"<navPoint id="Chapter1" playOrder="1">"#));
}

#[test]
fn empty_book_still_has_container_files() {
    init_logging();
    let mut book = BookBuilder::new();
    book.record(
        "gone",
        1,
        ChapterOutcome::Skipped(SkipReason::PageUnavailable("HTTP 500".to_string())),
    );

    let archive = book.finish(&metadata());

    assert_eq!(archive.len(), 4);
    let opf = String::from_utf8(archive.get("OEBPS/content.opf").unwrap().bytes.clone()).unwrap();
    assert!(opf.contains("<spine toc=\"ncx\">\n  </spine>"));
}
