use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use binder_core::{SuggestionMarker, TransformOptions, DEFAULT_LANGUAGE, DEFAULT_STYLESHEET};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fetch::FetchSettings;

pub const DEFAULT_BASE_URL: &str = "https://tamil.pratilipi.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://tamil.pratilipi.com/graphql";
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// Everything that ties the binder to one particular serial site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Chapter read-page paths are joined onto this.
    pub base_url: String,
    pub graphql_url: String,
    /// Sent with every listing request.
    pub graphql_headers: Vec<(String, String)>,
    pub page_size: u32,
    /// `xml:lang` and `dc:language` of generated books.
    pub language: String,
    pub selectors: PageSelectors,
    pub suggestion_element: String,
    pub suggestion_attributes: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let marker = SuggestionMarker::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            graphql_headers: vec![
                ("Apollographql-client-name".to_string(), "WEB_prod".to_string()),
                ("Apollographql-client-version".to_string(), "1.0.0".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            page_size: DEFAULT_PAGE_SIZE,
            language: DEFAULT_LANGUAGE.to_string(),
            selectors: PageSelectors::default(),
            suggestion_element: marker.element,
            suggestion_attributes: marker.attributes,
        }
    }
}

impl SiteConfig {
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            marker: SuggestionMarker {
                element: self.suggestion_element.clone(),
                attributes: self.suggestion_attributes.clone(),
            },
            language: self.language.clone(),
            stylesheet_href: DEFAULT_STYLESHEET.to_string(),
        }
    }
}

/// CSS selectors used against rendered pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSelectors {
    /// Container whose presence marks a readable chapter page.
    pub book_content: String,
    /// Chapter heading, looked up inside `book_content`.
    pub heading: String,
    /// Chapter body; its outer HTML is what gets transformed.
    pub content_section: String,
    /// Series title on the series landing page.
    pub series_title: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            book_content: "div .book-content".to_string(),
            heading: "h1".to_string(),
            content_section: "div .content-section".to_string(),
            series_title: "h1.title".to_string(),
        }
    }
}

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub site: SiteConfig,
    pub fetch: FetchSettings,
    pub output_dir: PathBuf,
    /// Supplies the package modification date.
    pub today: Clock,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            site: SiteConfig::default(),
            fetch: FetchSettings::default(),
            output_dir,
            today: Arc::new(|| chrono::Utc::now().date_naive()),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("site", &self.site)
            .field("fetch", &self.fetch)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}
