//! Binder engine: network, page extraction and file output around
//! `binder_core`.
mod archive;
mod binder;
mod config;
mod decode;
mod engine;
mod extract;
mod fetch;
mod filename;
mod listing;
mod persist;
mod resources;
mod sink;
mod types;

pub use archive::{epub_bytes, write_epub, ArchiveError};
pub use binder::{BindError, BindSummary, SeriesBinder};
pub use config::{
    Clock, EngineConfig, PageSelectors, SiteConfig, DEFAULT_BASE_URL, DEFAULT_GRAPHQL_URL,
    DEFAULT_PAGE_SIZE,
};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use engine::EngineHandle;
pub use extract::{ExtractError, PageExtractor, SelectorExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::{epub_filename, series_slug};
pub use listing::{display_date, fetch_listing, ListingError, SeriesListing, MAX_LISTING_PAGES};
pub use persist::{ensure_output_dir, BookWriter, PersistError};
pub use resources::{resolve_reference, PageResourceFetcher};
pub use sink::{ChannelSink, DiscardSink, ProgressSink};
pub use types::{
    EngineEvent, FetchError, FetchFailure, FetchedResource, JobFailure, JobId, JobProgress,
    ResponseInfo, Stage,
};
