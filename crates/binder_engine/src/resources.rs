use binder_core::{ResourceFetchError, ResourceFetcher};
use tokio::runtime::Runtime;
use url::Url;

use crate::fetch::Fetcher;

/// Resolve an image reference found on `page`. Only http(s) targets are
/// fetchable.
pub fn resolve_reference(reference: &str, page: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => page.join(trimmed).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Blocking image fetcher for one chapter page, driving the async fetcher
/// on the binder's runtime.
pub struct PageResourceFetcher<'a> {
    fetcher: &'a dyn Fetcher,
    runtime: &'a Runtime,
    page_url: &'a Url,
}

impl<'a> PageResourceFetcher<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, runtime: &'a Runtime, page_url: &'a Url) -> Self {
        Self {
            fetcher,
            runtime,
            page_url,
        }
    }
}

impl ResourceFetcher for PageResourceFetcher<'_> {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, ResourceFetchError> {
        let url = resolve_reference(reference, self.page_url)
            .ok_or_else(|| ResourceFetchError::new(reference, "unresolvable reference"))?;
        self.runtime
            .block_on(self.fetcher.get(url.as_str()))
            .map(|output| output.bytes)
            .map_err(|err| ResourceFetchError::new(reference, err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_reference;
    use url::Url;

    #[test]
    fn relative_references_resolve_against_the_page() {
        let page = Url::parse("https://tamil.example/read/part-1?x=1").unwrap();
        assert_eq!(
            resolve_reference("/img/a.png", &page).unwrap().as_str(),
            "https://tamil.example/img/a.png"
        );
        assert_eq!(
            resolve_reference("b.png", &page).unwrap().as_str(),
            "https://tamil.example/read/b.png"
        );
        assert_eq!(
            resolve_reference("//cdn.example/c", &page).unwrap().as_str(),
            "https://cdn.example/c"
        );
    }

    #[test]
    fn non_http_references_are_rejected() {
        let page = Url::parse("https://tamil.example/read/part-1").unwrap();
        assert!(resolve_reference("data:image/png;base64,AAAA", &page).is_none());
        assert!(resolve_reference("  ", &page).is_none());
        assert!(resolve_reference("#top", &page).is_none());
    }
}
