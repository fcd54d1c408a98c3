use std::io::{Cursor, Read};

use binder_core::EpubArchive;
use binder_engine::epub_bytes;
use pretty_assertions::assert_eq;
use zip::{CompressionMethod, ZipArchive};

#[test]
fn mimetype_is_the_first_stored_entry() {
    let mut archive = EpubArchive::new();
    archive.push("OEBPS/content.opf", "<package/>");
    archive.push("OEBPS/Images/ch1_img1", vec![0xFF, 0xD8, 0xFF, 0xE0]);

    let bytes = epub_bytes(&archive).expect("zip written");
    let mut zip = ZipArchive::new(Cursor::new(bytes)).expect("zip readable");

    let names: Vec<_> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "mimetype",
            "META-INF/container.xml",
            "OEBPS/content.opf",
            "OEBPS/Images/ch1_img1",
        ]
    );

    let mut mimetype = zip.by_index(0).unwrap();
    assert_eq!(mimetype.compression(), CompressionMethod::Stored);
    let mut content = String::new();
    mimetype.read_to_string(&mut content).unwrap();
    assert_eq!(content, "application/epub+zip\n");
    drop(mimetype);

    let opf = zip.by_name("OEBPS/content.opf").unwrap();
    assert_eq!(opf.compression(), CompressionMethod::Deflated);
}

#[test]
fn mimetype_is_readable_at_a_fixed_offset() {
    let bytes = epub_bytes(&EpubArchive::new()).expect("zip written");

    // Local file header is 30 bytes; name and extra field follow, then the
    // raw content.
    assert_eq!(&bytes[0..4], b"PK\x03\x04");
    assert_eq!(&bytes[30..38], b"mimetype");
    let extra_len = u16::from_le_bytes([bytes[28], bytes[29]]) as usize;
    let start = 38 + extra_len;
    assert_eq!(&bytes[start..start + 20], b"application/epub+zip");
}
