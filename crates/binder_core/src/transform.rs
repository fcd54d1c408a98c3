//! Chapter markup → XHTML document.
//!
//! The content section of a chapter page is tokenized with html5ever and
//! scanned once, left to right. Two rewrites happen during the scan:
//!
//! - suggestion markers (`<span data-suggestions="fixed">typo</span>`) are
//!   replaced by their attribute value, dropping the wrapped text;
//! - images are fetched through a [`ResourceFetcher`], stored as
//!   [`ExtractedResource`]s and their `src` pointed at the archive copy.
//!
//! Everything else is copied through. The tokenizer decodes character
//! references, so text and attribute values come out entity-decoded.

use std::cell::RefCell;

use binder_logging::{binder_debug, binder_warn};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use crate::escape::escape_xml;
use crate::types::{ChapterMarkup, ContentDocument, ExtractedResource};

pub const DEFAULT_STYLESHEET: &str = "css/main.css";
pub const DEFAULT_LANGUAGE: &str = "ta";

const DOCUMENT_CLOSE: &str = "</body>\n</html>\n";

/// Byte source for images referenced by chapter markup.
///
/// `reference` is the `src` attribute exactly as it appears in the markup
/// (entity-decoded); implementations resolve relative references themselves.
pub trait ResourceFetcher {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, ResourceFetchError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch {reference}: {message}")]
pub struct ResourceFetchError {
    pub reference: String,
    pub message: String,
}

impl ResourceFetchError {
    pub fn new(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// Element + attribute pair the source site uses to carry corrected text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionMarker {
    pub element: String,
    pub attributes: Vec<String>,
}

impl Default for SuggestionMarker {
    fn default() -> Self {
        Self {
            element: "span".to_string(),
            attributes: vec!["data-suggestions".to_string(), "data-suggestion".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    pub marker: SuggestionMarker,
    /// Value of `xml:lang` on the generated documents.
    pub language: String,
    pub stylesheet_href: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            marker: SuggestionMarker::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            stylesheet_href: DEFAULT_STYLESHEET.to_string(),
        }
    }
}

/// Result of running one chapter through the transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    Accepted(AcceptedChapter),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The page did not expose the content container.
    ContentAbsent,
    /// The page itself could not be retrieved.
    PageUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedChapter {
    pub document: ContentDocument,
    pub resources: Vec<ExtractedResource>,
    /// Images left pointing at their original source.
    pub failed_fetches: Vec<ResourceFetchError>,
}

/// Output of scanning a content section, before it is wrapped in a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformedContent {
    pub content: String,
    pub resources: Vec<ExtractedResource>,
    pub failed_fetches: Vec<ResourceFetchError>,
}

#[derive(Debug, Clone, Default)]
pub struct ChapterTransformer {
    options: TransformOptions,
}

impl ChapterTransformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Turn a chapter's markup into a document.
    ///
    /// `markup` is `None` when the page lacked the content container; that is
    /// reported as [`SkipReason::ContentAbsent`], never as an error.
    pub fn transform(
        &self,
        title: &str,
        sequence: u32,
        markup: Option<&ChapterMarkup>,
        fetcher: &dyn ResourceFetcher,
    ) -> ChapterOutcome {
        let Some(markup) = markup else {
            return ChapterOutcome::Skipped(SkipReason::ContentAbsent);
        };

        let transformed = self.transform_content(&markup.content_html, sequence, fetcher);
        let xhtml = self.wrap_document(title, &markup.heading_html, &transformed.content);
        binder_debug!(
            "chapter {} transformed: {} bytes, {} images, {} failed",
            sequence,
            xhtml.len(),
            transformed.resources.len(),
            transformed.failed_fetches.len()
        );

        ChapterOutcome::Accepted(AcceptedChapter {
            document: ContentDocument {
                title: title.to_string(),
                sequence,
                xhtml,
            },
            resources: transformed.resources,
            failed_fetches: transformed.failed_fetches,
        })
    }

    /// Scan a content section, rewriting suggestions and images.
    pub fn transform_content(
        &self,
        content_html: &str,
        sequence: u32,
        fetcher: &dyn ResourceFetcher,
    ) -> TransformedContent {
        let mut scan = Scan::new(&self.options.marker, fetcher, sequence);
        for token in tokenize(content_html) {
            scan.feed(token);
        }
        if scan.state != ScanState::Normal {
            binder_warn!("chapter {}: suggestion marker never closed", sequence);
        }
        scan.finish()
    }

    fn wrap_document(&self, title: &str, heading_html: &str, content: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="{lang}">
  <head>
    <meta http-equiv="Content-Type" content="application/xhtml+xml; charset=utf-8" />
    <title>{title}</title>
    <link rel="stylesheet" href="{css}" type="text/css" />
  </head>
  <body>
{heading_html}

{content}{DOCUMENT_CLOSE}"#,
            lang = escape_xml(&self.options.language),
            title = escape_xml(title),
            css = escape_xml(&self.options.stylesheet_href),
        )
    }
}

#[derive(Default)]
struct TokenCollector {
    tokens: RefCell<Vec<Token>>,
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        self.tokens.borrow_mut().push(token);
        TokenSinkResult::Continue
    }
}

fn tokenize(markup: &str) -> Vec<Token> {
    let tokenizer = Tokenizer::new(TokenCollector::default(), TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(markup));
    let _ = tokenizer.feed(&input);
    tokenizer.end();
    tokenizer.sink.tokens.take()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    /// Between a marker's open tag and its matching close tag; every token
    /// is dropped. `depth` counts open marker elements, the marker included.
    InsideSuggestion { depth: u32 },
}

struct Scan<'a> {
    marker: &'a SuggestionMarker,
    fetcher: &'a dyn ResourceFetcher,
    sequence: u32,
    state: ScanState,
    next_image: u32,
    out: TransformedContent,
}

impl<'a> Scan<'a> {
    fn new(marker: &'a SuggestionMarker, fetcher: &'a dyn ResourceFetcher, sequence: u32) -> Self {
        Self {
            marker,
            fetcher,
            sequence,
            state: ScanState::Normal,
            next_image: 1,
            out: TransformedContent::default(),
        }
    }

    fn finish(self) -> TransformedContent {
        self.out
    }

    fn feed(&mut self, token: Token) {
        match self.state {
            ScanState::Normal => self.feed_normal(token),
            ScanState::InsideSuggestion { depth } => self.feed_suggestion(token, depth),
        }
    }

    fn feed_normal(&mut self, token: Token) {
        match token {
            Token::TagToken(tag) => self.normal_tag(&tag),
            Token::CharacterTokens(text) => self.out.content.push_str(&text),
            Token::CommentToken(text) => {
                self.out.content.push_str("<!--");
                self.out.content.push_str(&text);
                self.out.content.push_str("-->");
            }
            _ => {}
        }
    }

    fn normal_tag(&mut self, tag: &Tag) {
        if tag.kind == TagKind::StartTag {
            if let Some(replacement) = self.suggestion_value(tag) {
                self.out.content.push_str(&replacement);
                if !tag.self_closing {
                    self.state = ScanState::InsideSuggestion { depth: 1 };
                }
                return;
            }
            if &*tag.name == "img" {
                self.image(tag);
                return;
            }
        }
        write_tag(&mut self.out.content, tag, None);
    }

    fn feed_suggestion(&mut self, token: Token, depth: u32) {
        let Token::TagToken(tag) = token else {
            return;
        };
        if !self.is_marker_element(&tag) {
            return;
        }
        let depth = match tag.kind {
            TagKind::EndTag => depth - 1,
            TagKind::StartTag if tag.self_closing => depth,
            TagKind::StartTag => {
                if self.suggestion_value(&tag).is_some() {
                    // Nested markers have no defined meaning upstream; the
                    // inner one is dropped like any other nested element.
                    binder_warn!(
                        "chapter {}: nested suggestion marker ignored",
                        self.sequence
                    );
                }
                depth + 1
            }
        };
        self.state = if depth == 0 {
            ScanState::Normal
        } else {
            ScanState::InsideSuggestion { depth }
        };
    }

    fn is_marker_element(&self, tag: &Tag) -> bool {
        let name: &str = &tag.name;
        name.eq_ignore_ascii_case(&self.marker.element)
    }

    fn suggestion_value(&self, tag: &Tag) -> Option<String> {
        if !self.is_marker_element(tag) {
            return None;
        }
        tag.attrs
            .iter()
            .find(|attr| {
                self.marker
                    .attributes
                    .iter()
                    .any(|name| name.as_str() == &*attr.name.local)
            })
            .map(|attr| attr.value.to_string())
    }

    fn image(&mut self, tag: &Tag) {
        let Some(src) = tag.attrs.iter().find(|attr| &*attr.name.local == "src") else {
            write_tag(&mut self.out.content, tag, None);
            return;
        };

        match self.fetcher.fetch(&src.value) {
            Ok(bytes) => {
                let resource = ExtractedResource::new(self.sequence, self.next_image, bytes);
                write_tag(&mut self.out.content, tag, Some(&resource.document_href()));
                binder_debug!(
                    "chapter {}: {} stored as {} ({})",
                    self.sequence,
                    &*src.value,
                    resource.path,
                    resource.media_type
                );
                self.out.resources.push(resource);
                self.next_image += 1;
            }
            Err(err) => {
                binder_warn!("chapter {}: {}", self.sequence, err);
                write_tag(&mut self.out.content, tag, None);
                self.out.failed_fetches.push(err);
            }
        }
    }
}

/// Serialize a tag token. With `src_override` the `src` attribute is replaced
/// and the tag is closed XHTML-style.
fn write_tag(out: &mut String, tag: &Tag, src_override: Option<&str>) {
    if tag.kind == TagKind::EndTag {
        out.push_str("</");
        out.push_str(&tag.name);
        out.push('>');
        return;
    }

    out.push('<');
    out.push_str(&tag.name);
    for attr in &tag.attrs {
        let name: &str = &attr.name.local;
        let value: &str = match src_override {
            Some(src) if name == "src" => src,
            _ => &*attr.value,
        };
        out.push(' ');
        out.push_str(name);
        out.push('=');
        match (value.contains('"'), value.contains('\'')) {
            (true, false) => {
                out.push('\'');
                out.push_str(value);
                out.push('\'');
            }
            (true, true) => {
                out.push('"');
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
            _ => {
                out.push('"');
                out.push_str(value);
                out.push('"');
            }
        }
    }
    if tag.self_closing || src_override.is_some() {
        out.push_str("/>");
    } else {
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_decodes_entities_in_text_and_attributes() {
        let tokens = tokenize(r#"<a title="x &amp; y">1 &lt; 2</a>"#);
        let mut out = String::new();
        for token in tokens {
            match token {
                Token::TagToken(tag) => write_tag(&mut out, &tag, None),
                Token::CharacterTokens(text) => out.push_str(&text),
                _ => {}
            }
        }
        assert_eq!(out, r#"<a title="x & y">1 < 2</a>"#);
    }

    #[test]
    fn attribute_values_with_double_quotes_switch_quote_style() {
        let tokens = tokenize(r#"<p data-x='say "hi"'>"#);
        let mut out = String::new();
        for token in tokens {
            if let Token::TagToken(tag) = token {
                write_tag(&mut out, &tag, None);
            }
        }
        assert_eq!(out, r#"<p data-x='say "hi"'>"#);
    }

    #[test]
    fn attribute_values_with_both_quotes_escape_the_double_ones() {
        let tokens = tokenize(r#"<p title="a&quot;b'c">"#);
        let mut out = String::new();
        for token in tokens {
            if let Token::TagToken(tag) = token {
                write_tag(&mut out, &tag, None);
            }
        }
        assert_eq!(out, r#"<p title="a&quot;b'c">"#);
    }
}
