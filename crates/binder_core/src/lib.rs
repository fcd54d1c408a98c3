//! Binder core: chapter transformation and EPUB package assembly.
//!
//! Nothing in here performs I/O. Images are pulled through the
//! [`ResourceFetcher`] seam and the finished book comes out as an ordered
//! [`EpubArchive`] that the engine writes to disk.
mod book;
mod container;
mod escape;
mod metadata;
mod resources;
mod sniff;
mod transform;
mod types;

pub use book::{BookBuilder, SkippedChapter};
pub use container::{
    ArchiveEntry, Compression, EpubArchive, CONTAINER_PATH, CONTAINER_XML, MIMETYPE_CONTENT,
    MIMETYPE_PATH,
};
pub use escape::escape_xml;
pub use metadata::{
    content_opf, generate, toc_ncx, ChapterEntry, PackageDocuments, PackageMetadata, NCX_HREF,
    NCX_ID, NCX_MEDIA_TYPE,
};
pub use resources::{collect_resources, resource_manifest_items};
pub use sniff::{sniff_media_type, MediaType};
pub use transform::{
    AcceptedChapter, ChapterOutcome, ChapterTransformer, ResourceFetchError, ResourceFetcher,
    SkipReason, SuggestionMarker, TransformOptions, TransformedContent, DEFAULT_LANGUAGE,
    DEFAULT_STYLESHEET,
};
pub use types::{
    ChapterMarkup, ChapterMeta, ContentDocument, ExtractedResource, ManifestItem, XHTML_MEDIA_TYPE,
};
