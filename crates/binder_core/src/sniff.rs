//! Content sniffing for extracted resources.
//!
//! Only the leading bytes are inspected; file names and server headers are
//! never trusted since image sources are often extension-less CDN paths.

const SNIFF_LEN: usize = 512;

/// A media type the sniffer can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Icon,
    Avif,
    Svg,
    Html,
    Xml,
    PlainText,
    OctetStream,
}

impl MediaType {
    /// Canonical string form, as written into the package manifest.
    pub const fn as_str(&self) -> &'static str {
        use MediaType::*;
        match self {
            Jpeg => "image/jpeg",
            Png => "image/png",
            Gif => "image/gif",
            Webp => "image/webp",
            Bmp => "image/bmp",
            Icon => "image/x-icon",
            Avif => "image/avif",
            Svg => "image/svg+xml",
            Html => "text/html; charset=utf-8",
            Xml => "text/xml; charset=utf-8",
            PlainText => "text/plain; charset=utf-8",
            OctetStream => "application/octet-stream",
        }
    }
}

/// Classify `bytes` by their signature.
pub fn sniff_media_type(bytes: &[u8]) -> MediaType {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];

    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return MediaType::Jpeg;
    }
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return MediaType::Png;
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return MediaType::Gif;
    }
    if head.len() >= 14 && head.starts_with(b"RIFF") && &head[8..14] == b"WEBPVP" {
        return MediaType::Webp;
    }
    if head.len() >= 12 && &head[4..12] == b"ftypavif" {
        return MediaType::Avif;
    }
    if head.starts_with(b"BM") {
        return MediaType::Bmp;
    }
    if head.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        return MediaType::Icon;
    }

    let text = trim_leading_whitespace(head);
    if starts_with_ignore_case(text, b"<svg") {
        return MediaType::Svg;
    }
    if starts_with_ignore_case(text, b"<?xml") {
        if contains(text, b"<svg") {
            return MediaType::Svg;
        }
        return MediaType::Xml;
    }
    const HTML_PREFIXES: &[&[u8]] = &[
        b"<!doctype html",
        b"<html",
        b"<head",
        b"<body",
        b"<div",
        b"<p",
        b"<!--",
    ];
    if HTML_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_case(text, prefix))
    {
        return MediaType::Html;
    }

    if head.iter().any(|&b| is_binary_byte(b)) {
        MediaType::OctetStream
    } else {
        MediaType::PlainText
    }
}

fn trim_leading_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn starts_with_ignore_case(haystack: &[u8], prefix: &[u8]) -> bool {
    haystack.len() >= prefix.len() && haystack[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::{sniff_media_type, MediaType};

    #[test]
    fn recognises_common_image_signatures() {
        assert_eq!(sniff_media_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]), MediaType::Jpeg);
        assert_eq!(sniff_media_type(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), MediaType::Png);
        assert_eq!(sniff_media_type(b"GIF89a\x01\x00"), MediaType::Gif);
        assert_eq!(sniff_media_type(b"RIFF\x24\0\0\0WEBPVP8 "), MediaType::Webp);
        assert_eq!(sniff_media_type(b"\0\0\0\x1cftypavif"), MediaType::Avif);
    }

    #[test]
    fn svg_is_detected_with_and_without_prolog() {
        assert_eq!(sniff_media_type(b"  <svg xmlns='x'/>"), MediaType::Svg);
        assert_eq!(
            sniff_media_type(b"<?xml version=\"1.0\"?>\n<svg></svg>"),
            MediaType::Svg
        );
        assert_eq!(sniff_media_type(b"<?xml version=\"1.0\"?><root/>"), MediaType::Xml);
    }

    #[test]
    fn unknown_payloads_fall_back_to_text_or_binary() {
        assert_eq!(sniff_media_type(b"just words"), MediaType::PlainText);
        assert_eq!(sniff_media_type(&[0x01, 0x02, 0x03]), MediaType::OctetStream);
        assert_eq!(sniff_media_type(b"<!DOCTYPE html><html>"), MediaType::Html);
    }
}
