use crate::transform::AcceptedChapter;
use crate::types::{ExtractedResource, ManifestItem};

/// Flatten the resources of accepted chapters into one archive-wide list.
///
/// Chapter order and per-chapter emission order are preserved. Ids embed the
/// chapter sequence number, so no deduplication is needed.
pub fn collect_resources<'a, I>(chapters: I) -> Vec<&'a ExtractedResource>
where
    I: IntoIterator<Item = &'a AcceptedChapter>,
{
    chapters
        .into_iter()
        .flat_map(|chapter| chapter.resources.iter())
        .collect()
}

pub fn resource_manifest_items(resources: &[&ExtractedResource]) -> Vec<ManifestItem> {
    resources.iter().map(|r| r.manifest_item()).collect()
}
