//! Series listing over the site's GraphQL endpoint.

use binder_core::ChapterMeta;
use binder_logging::{binder_debug, binder_info, binder_warn};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;
use crate::fetch::Fetcher;
use crate::FetchError;

/// Upper bound on listing requests for one series.
pub const MAX_LISTING_PAGES: usize = 1000;

const OPERATION_NAME: &str = "getSeriesPartsPaginatedBySlug";
const SERIES_PARTS_QUERY: &str = "query getSeriesPartsPaginatedBySlug($where: GetSeriesInput!, $page: LimitCursorPageInput) { getSeries(where: $where) { series { publishedParts(page: $page) { parts { pratilipi { title readPageUrl publishedAt author { displayName } pratilipiEarlyAccess { isEarlyAccess } } } } } } }";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingError {
    #[error("listing request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("listing response is not valid JSON: {0}")]
    Decode(String),
    #[error("listing query rejected: {0}")]
    Graphql(String),
    #[error("series {0:?} not found")]
    SeriesNotFound(String),
    #[error("series {0:?} has no published chapters")]
    NoChapters(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesListing {
    pub author: String,
    /// Chapters in reading order, early-access ones excluded.
    pub chapters: Vec<ChapterMeta>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListingRequest<'a> {
    operation_name: &'a str,
    variables: Variables<'a>,
    query: &'a str,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    #[serde(rename = "where")]
    filter: Where<'a>,
    page: Page,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Where<'a> {
    series_slug: &'a str,
}

#[derive(Debug, Serialize)]
struct Page {
    limit: u32,
    cursor: String,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    get_series: Option<GetSeries>,
}

#[derive(Debug, Deserialize)]
struct GetSeries {
    series: Option<Series>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Series {
    published_parts: Option<PublishedParts>,
}

#[derive(Debug, Deserialize)]
struct PublishedParts {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    pratilipi: Pratilipi,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pratilipi {
    title: String,
    read_page_url: String,
    #[serde(default)]
    published_at: i64,
    author: Option<Author>,
    pratilipi_early_access: Option<EarlyAccess>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Author {
    display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarlyAccess {
    is_early_access: bool,
}

/// Walk the paginated listing of `slug`.
///
/// Stops at the first short page or the first early-access part; that part
/// and everything after it are left out. A page that starts with the same
/// part as the page before it means the server ignores the cursor, and ends
/// the walk, as does reaching [`MAX_LISTING_PAGES`].
pub async fn fetch_listing(
    fetcher: &dyn Fetcher,
    site: &SiteConfig,
    slug: &str,
) -> Result<SeriesListing, ListingError> {
    let limit = site.page_size.max(1);
    let mut cursor: u64 = 0;
    let mut author: Option<String> = None;
    let mut chapters = Vec::new();
    let mut previous_first: Option<String> = None;

    'pages: for page_number in 1..=MAX_LISTING_PAGES {
        let parts = fetch_page(fetcher, site, slug, limit, cursor).await?;
        binder_debug!("listing page at cursor {}: {} parts", cursor, parts.len());
        let last_page = parts.len() < limit as usize;

        let first = parts.first().map(|part| part.pratilipi.read_page_url.clone());
        if first.is_some() && first == previous_first {
            binder_warn!("listing page at cursor {} repeats the previous page", cursor);
            break;
        }
        previous_first = first;

        for Part { pratilipi } in parts {
            if author.is_none() {
                author = pratilipi.author.as_ref().map(|a| a.display_name.clone());
            }
            if pratilipi
                .pratilipi_early_access
                .as_ref()
                .is_some_and(|e| e.is_early_access)
            {
                binder_info!("stopping at early-access part {:?}", pratilipi.title);
                break 'pages;
            }
            chapters.push(ChapterMeta {
                published: display_date(pratilipi.published_at),
                title: pratilipi.title,
                read_page_url: pratilipi.read_page_url,
            });
        }

        if last_page {
            break;
        }
        if page_number == MAX_LISTING_PAGES {
            binder_warn!("listing truncated after {} pages", MAX_LISTING_PAGES);
        }
        cursor += u64::from(limit);
    }

    if chapters.is_empty() {
        return Err(ListingError::NoChapters(slug.to_string()));
    }
    Ok(SeriesListing {
        author: author.unwrap_or_default(),
        chapters,
    })
}

async fn fetch_page(
    fetcher: &dyn Fetcher,
    site: &SiteConfig,
    slug: &str,
    limit: u32,
    cursor: u64,
) -> Result<Vec<Part>, ListingError> {
    let request = ListingRequest {
        operation_name: OPERATION_NAME,
        variables: Variables {
            filter: Where { series_slug: slug },
            page: Page {
                limit,
                cursor: cursor.to_string(),
            },
        },
        query: SERIES_PARTS_QUERY,
    };
    let body = serde_json::to_vec(&request).map_err(|err| ListingError::Decode(err.to_string()))?;

    let output = fetcher
        .post(&site.graphql_url, &site.graphql_headers, body)
        .await?;
    let response: ListingResponse = serde_json::from_slice(&output.bytes)
        .map_err(|err| ListingError::Decode(err.to_string()))?;

    if !response.errors.is_empty() {
        let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(ListingError::Graphql(messages.join("; ")));
    }

    response
        .data
        .and_then(|d| d.get_series)
        .and_then(|g| g.series)
        .map(|s| s.published_parts.map(|p| p.parts).unwrap_or_default())
        .ok_or_else(|| ListingError::SeriesNotFound(slug.to_string()))
}

/// `Jan 5, 2023`, in UTC. Out-of-range timestamps give an empty string.
pub fn display_date(published_at_ms: i64) -> String {
    DateTime::from_timestamp_millis(published_at_ms)
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_the_wire_shape() {
        let request = ListingRequest {
            operation_name: OPERATION_NAME,
            variables: Variables {
                filter: Where { series_slug: "nila" },
                page: Page {
                    limit: 15,
                    cursor: "30".to_string(),
                },
            },
            query: "q",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "operationName": "getSeriesPartsPaginatedBySlug",
                "variables": {
                    "where": { "seriesSlug": "nila" },
                    "page": { "limit": 15, "cursor": "30" }
                },
                "query": "q"
            })
        );
    }

    #[test]
    fn dates_render_in_display_form() {
        assert_eq!(display_date(1_672_876_800_000), "Jan 5, 2023");
        assert_eq!(display_date(i64::MAX), "");
    }
}
