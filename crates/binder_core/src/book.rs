use crate::container::EpubArchive;
use crate::metadata::{self, ChapterEntry, PackageMetadata};
use crate::resources::{collect_resources, resource_manifest_items};
use crate::transform::{AcceptedChapter, ChapterOutcome, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChapter {
    pub sequence: u32,
    pub title: String,
    pub reason: SkipReason,
}

/// Accumulates chapter outcomes in listing order and packs them into an
/// archive.
///
/// Chapters must be recorded in listing order with distinct sequence numbers.
#[derive(Debug, Clone, Default)]
pub struct BookBuilder {
    accepted: Vec<AcceptedChapter>,
    skipped: Vec<SkippedChapter>,
}

impl BookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one chapter. Returns the chapter's number in the book (dense
    /// over accepted chapters) or `None` if it was skipped.
    pub fn record(&mut self, title: &str, sequence: u32, outcome: ChapterOutcome) -> Option<usize> {
        match outcome {
            ChapterOutcome::Accepted(chapter) => {
                self.accepted.push(chapter);
                Some(self.accepted.len())
            }
            ChapterOutcome::Skipped(reason) => {
                self.skipped.push(SkippedChapter {
                    sequence,
                    title: title.to_string(),
                    reason,
                });
                None
            }
        }
    }

    pub fn accepted(&self) -> &[AcceptedChapter] {
        &self.accepted
    }

    pub fn skipped(&self) -> &[SkippedChapter] {
        &self.skipped
    }

    pub fn failed_fetch_count(&self) -> usize {
        self.accepted.iter().map(|c| c.failed_fetches.len()).sum()
    }

    pub fn chapter_entries(&self) -> Vec<ChapterEntry> {
        self.accepted
            .iter()
            .map(|c| ChapterEntry {
                title: c.document.title.clone(),
                file_name: c.document.file_name(),
            })
            .collect()
    }

    /// Generate the package documents and lay out every archive entry.
    pub fn finish(self, metadata: &PackageMetadata) -> EpubArchive {
        let resources = collect_resources(&self.accepted);
        let documents = metadata::generate(
            metadata,
            &self.chapter_entries(),
            &resource_manifest_items(&resources),
        );

        let mut archive = EpubArchive::new();
        archive.push("OEBPS/content.opf", documents.content_opf);
        archive.push("OEBPS/toc.ncx", documents.toc_ncx);
        for chapter in &self.accepted {
            archive.push(chapter.document.archive_path(), chapter.document.xhtml.as_bytes());
        }
        for resource in resources {
            archive.push(resource.archive_path(), resource.bytes.as_slice());
        }
        archive
    }
}
