//! One series, end to end: listing, chapter pages, images, archive, file.

use std::path::PathBuf;
use std::sync::Arc;

use binder_core::{
    BookBuilder, ChapterMeta, ChapterOutcome, ChapterTransformer, PackageMetadata, SkipReason,
    SkippedChapter,
};
use binder_logging::{binder_debug, binder_info, binder_warn, enter_series};
use tokio::runtime::Runtime;
use url::Url;

use crate::archive::{epub_bytes, ArchiveError};
use crate::config::EngineConfig;
use crate::decode::decode_page;
use crate::extract::{PageExtractor, SelectorExtractor};
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::filename::{epub_filename, series_slug};
use crate::listing::{fetch_listing, ListingError};
use crate::persist::{BookWriter, PersistError};
use crate::resources::PageResourceFetcher;
use crate::sink::ProgressSink;
use crate::{EngineEvent, FetchError, JobFailure, JobId, JobProgress, Stage};

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("invalid series url {url:?}: {message}")]
    InvalidSeriesUrl { url: String, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("series page unavailable: {0}")]
    SeriesPage(#[source] FetchError),
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error("none of the {listed} listed chapters could be bound")]
    NoAcceptedChapters { listed: usize },
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl BindError {
    pub fn stage(&self) -> Stage {
        match self {
            BindError::InvalidSeriesUrl { .. } | BindError::Config(_) | BindError::Runtime(_) => {
                Stage::Queued
            }
            BindError::SeriesPage(_) | BindError::Listing(_) => Stage::Listing,
            BindError::NoAcceptedChapters { .. } => Stage::FetchingChapters,
            BindError::Archive(_) => Stage::Assembling,
            BindError::Persist(_) => Stage::Writing,
        }
    }

    pub fn to_failure(&self) -> JobFailure {
        JobFailure {
            stage: self.stage(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindSummary {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub output_path: PathBuf,
    /// Chapters that made it into the book.
    pub accepted: usize,
    pub skipped: Vec<SkippedChapter>,
    pub failed_images: usize,
}

pub struct SeriesBinder {
    config: EngineConfig,
    base_url: Url,
    fetcher: Arc<dyn Fetcher>,
    extractor: SelectorExtractor,
    transformer: ChapterTransformer,
    writer: BookWriter,
    runtime: Runtime,
}

impl SeriesBinder {
    pub fn new(config: EngineConfig) -> Result<Self, BindError> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, BindError> {
        let base_url = Url::parse(&config.site.base_url)
            .map_err(|err| BindError::Config(format!("base_url: {err}")))?;
        let extractor = SelectorExtractor::new(&config.site.selectors)
            .map_err(|err| BindError::Config(err.to_string()))?;
        let transformer = ChapterTransformer::new(config.site.transform_options());
        let writer = BookWriter::new(config.output_dir.clone());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(BindError::Runtime)?;

        Ok(Self {
            config,
            base_url,
            fetcher,
            extractor,
            transformer,
            writer,
            runtime,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bind the series at `series_url` into `<output_dir>/<slug>.epub`.
    ///
    /// Chapters that cannot be read are skipped and reported through `sink`;
    /// only failures that leave nothing to write end the job.
    pub fn bind(
        &self,
        job_id: JobId,
        series_url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<BindSummary, BindError> {
        let url = Url::parse(series_url.trim()).map_err(|err| BindError::InvalidSeriesUrl {
            url: series_url.to_string(),
            message: err.to_string(),
        })?;
        let slug = series_slug(&url).ok_or_else(|| BindError::InvalidSeriesUrl {
            url: series_url.to_string(),
            message: "no series slug in path".to_string(),
        })?;
        let _series = enter_series(&slug);

        sink.emit(EngineEvent::Progress(JobProgress::stage(job_id, Stage::Listing)));
        let title = self.series_title(&url, &slug)?;
        let listing = self
            .runtime
            .block_on(fetch_listing(self.fetcher.as_ref(), &self.config.site, &slug))?;
        binder_info!(
            "{:?} by {:?}: {} chapters listed",
            title,
            listing.author,
            listing.chapters.len()
        );

        let total = listing.chapters.len();
        let mut book = BookBuilder::new();
        for (index, meta) in listing.chapters.iter().enumerate() {
            let sequence = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let outcome = self.bind_chapter(sequence, meta);

            if let ChapterOutcome::Accepted(chapter) = &outcome {
                for failed in &chapter.failed_fetches {
                    sink.emit(EngineEvent::ImageFailed {
                        job_id,
                        sequence,
                        reference: failed.reference.clone(),
                        message: failed.message.clone(),
                    });
                }
            }
            if let ChapterOutcome::Skipped(reason) = &outcome {
                binder_warn!("chapter {} {:?} skipped: {:?}", sequence, meta.title, reason);
                sink.emit(EngineEvent::ChapterSkipped {
                    job_id,
                    sequence,
                    title: meta.title.clone(),
                    reason: reason.clone(),
                });
            }
            book.record(&meta.title, sequence, outcome);

            sink.emit(EngineEvent::Progress(JobProgress {
                chapters_done: Some(index + 1),
                chapters_total: Some(total),
                ..JobProgress::stage(job_id, Stage::FetchingChapters)
            }));
        }

        if book.accepted().is_empty() {
            return Err(BindError::NoAcceptedChapters { listed: total });
        }

        sink.emit(EngineEvent::Progress(JobProgress::stage(job_id, Stage::Assembling)));
        let accepted = book.accepted().len();
        let skipped = book.skipped().to_vec();
        let failed_images = book.failed_fetch_count();
        let metadata = PackageMetadata {
            author: listing.author.clone(),
            identifier: slug.clone(),
            title: title.clone(),
            language: self.config.site.language.clone(),
            modified: (self.config.today)(),
        };
        let bytes = epub_bytes(&book.finish(&metadata))?;

        sink.emit(EngineEvent::Progress(JobProgress {
            bytes: Some(bytes.len() as u64),
            ..JobProgress::stage(job_id, Stage::Writing)
        }));
        let output_path = self.writer.write(&epub_filename(&slug), &bytes)?;
        binder_info!(
            "wrote {} ({} chapters, {} skipped, {} images failed)",
            output_path.display(),
            accepted,
            skipped.len(),
            failed_images
        );
        sink.emit(EngineEvent::Progress(JobProgress::stage(job_id, Stage::Done)));

        Ok(BindSummary {
            slug,
            title,
            author: listing.author,
            output_path,
            accepted,
            skipped,
            failed_images,
        })
    }

    fn series_title(&self, url: &Url, slug: &str) -> Result<String, BindError> {
        let page = self
            .runtime
            .block_on(self.fetcher.get(url.as_str()))
            .map_err(BindError::SeriesPage)?;

        let title = match decode_page(&page.bytes, page.response.content_type.as_deref()) {
            Ok(decoded) => self.extractor.series_title(&decoded.html),
            Err(err) => {
                binder_warn!("series page undecodable: {}", err);
                None
            }
        };
        Ok(title.unwrap_or_else(|| {
            binder_warn!("series title not found, using slug");
            slug.to_string()
        }))
    }

    fn bind_chapter(&self, sequence: u32, meta: &ChapterMeta) -> ChapterOutcome {
        let page_url = match self.base_url.join(&meta.read_page_url) {
            Ok(url) => url,
            Err(err) => {
                return ChapterOutcome::Skipped(SkipReason::PageUnavailable(format!(
                    "bad read page url {:?}: {err}",
                    meta.read_page_url
                )))
            }
        };
        binder_debug!("chapter {}: {}", sequence, page_url);

        let page = match self.runtime.block_on(self.fetcher.get(page_url.as_str())) {
            Ok(page) => page,
            Err(err) => return ChapterOutcome::Skipped(SkipReason::PageUnavailable(err.to_string())),
        };
        let decoded = match decode_page(&page.bytes, page.response.content_type.as_deref()) {
            Ok(decoded) => decoded,
            Err(err) => return ChapterOutcome::Skipped(SkipReason::PageUnavailable(err.to_string())),
        };

        let markup = self.extractor.chapter(&decoded.html, &meta.title);
        let resources = PageResourceFetcher::new(self.fetcher.as_ref(), &self.runtime, &page_url);
        self.transformer
            .transform(&meta.title, sequence, markup.as_ref(), &resources)
    }
}
