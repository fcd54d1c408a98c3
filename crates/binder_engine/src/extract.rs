use binder_core::{escape_xml, ChapterMarkup};
use scraper::{Html, Selector};

use crate::config::PageSelectors;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

pub trait PageExtractor: Send + Sync {
    /// Pull the heading and content section out of a chapter page. `None`
    /// when the page has no readable content.
    fn chapter(&self, html: &str, title: &str) -> Option<ChapterMarkup>;

    fn series_title(&self, html: &str) -> Option<String>;
}

/// Extractor driven by the configured CSS selectors.
#[derive(Debug)]
pub struct SelectorExtractor {
    book_content: Selector,
    heading: Selector,
    content_section: Selector,
    series_title: Selector,
}

impl SelectorExtractor {
    pub fn new(selectors: &PageSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            book_content: parse_selector(&selectors.book_content)?,
            heading: parse_selector(&selectors.heading)?,
            content_section: parse_selector(&selectors.content_section)?,
            series_title: parse_selector(&selectors.series_title)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|err| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

impl PageExtractor for SelectorExtractor {
    fn chapter(&self, html: &str, title: &str) -> Option<ChapterMarkup> {
        let doc = Html::parse_document(html);
        let book = doc.select(&self.book_content).next()?;
        let content = doc.select(&self.content_section).next()?;

        let heading_html = book
            .select(&self.heading)
            .next()
            .map(|h| h.html())
            .unwrap_or_else(|| format!("<h1>{}</h1>", escape_xml(title)));

        Some(ChapterMarkup {
            heading_html,
            content_html: content.html(),
        })
    }

    fn series_title(&self, html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        doc.select(&self.series_title)
            .next()
            .map(|t| collapse_whitespace(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
