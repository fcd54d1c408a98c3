//! HTTP access for series pages, the GraphQL listing and chapter images.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use binder_logging::binder_trace;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, Url};

use crate::{FetchError, FetchFailure, FetchedResource, ResponseInfo};

/// Media types a binder run expects to download: pages, listing JSON and
/// images of any kind.
const ACCEPTED_TYPES: &[&str] = &[
    "text/html",
    "application/xhtml+xml",
    "application/json",
    "application/graphql-response+json",
    "image/*",
    "application/octet-stream",
];

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// `type/subtype` patterns; `type/*` accepts a whole family. A response
    /// that names no content type is let through.
    pub accepted_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 20 * 1024 * 1024,
            accepted_types: ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
            user_agent: concat!("serial-binder/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchSettings {
    fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        let family = essence.split('/').next().unwrap_or_default();
        self.accepted_types
            .iter()
            .any(|pattern| match pattern.strip_suffix("/*") {
                Some(wanted) => family.eq_ignore_ascii_case(wanted),
                None => pattern.eq_ignore_ascii_case(essence),
            })
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedResource, FetchError>;

    /// POST `body` with extra `headers`, as the listing query needs.
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<FetchedResource, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    /// A client per request so the redirect policy can count hops for
    /// this request alone.
    fn client_counting(&self, hops: Arc<AtomicUsize>) -> Result<Client, FetchError> {
        let limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let seen = attempt.previous().len();
            hops.store(seen, Ordering::Relaxed);
            if seen <= limit {
                attempt.follow()
            } else {
                attempt.error(format!("more than {limit} redirects"))
            }
        });

        Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .user_agent(self.settings.user_agent.as_str())
            .redirect(policy)
            .build()
            .map_err(classify)
    }

    async fn send(
        &self,
        url: &str,
        request: impl FnOnce(&Client, Url) -> RequestBuilder + Send,
    ) -> Result<FetchedResource, FetchError> {
        let target =
            Url::parse(url).map_err(|err| FetchError::new(FetchFailure::BadUrl, err.to_string()))?;
        let hops = Arc::new(AtomicUsize::new(0));
        let client = self.client_counting(Arc::clone(&hops))?;

        let response = request(&client, target).send().await.map_err(classify)?;
        let content_type = self.screen(&response)?;
        let final_url = response.url().to_string();
        let bytes = read_capped(response, self.settings.max_bytes).await?;
        binder_trace!("{} -> {} bytes", final_url, bytes.len());

        Ok(FetchedResource {
            bytes,
            response: ResponseInfo {
                requested_url: url.to_string(),
                final_url,
                redirects: hops.load(Ordering::Relaxed),
                content_type,
            },
        })
    }

    /// Rejects a response from its head alone. Returns the content type.
    fn screen(&self, response: &Response) -> Result<Option<String>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchFailure::Status(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        let limit = self.settings.max_bytes;
        if let Some(declared) = response.content_length().filter(|len| *len > limit) {
            return Err(FetchError::new(
                FetchFailure::Oversized {
                    limit,
                    received: declared,
                },
                "declared length",
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        match content_type {
            Some(ct) if !self.settings.accepts(&ct) => Err(FetchError::new(
                FetchFailure::RejectedContentType(ct),
                response.url().as_str(),
            )),
            other => Ok(other),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchedResource, FetchError> {
        self.send(url, |client, target| client.get(target)).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<FetchedResource, FetchError> {
        let headers = to_header_map(headers)?;
        self.send(url, move |client, target| {
            client.post(target).headers(headers).body(body)
        })
        .await
    }
}

/// Streams the body, giving up as soon as it grows past `limit`.
async fn read_capped(response: Response, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(classify)?;
        let received = (body.len() + chunk.len()) as u64;
        if received > limit {
            return Err(FetchError::new(
                FetchFailure::Oversized { limit, received },
                "body stream",
            ));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn to_header_map(headers: &[(String, String)]) -> Result<HeaderMap, FetchError> {
    headers
        .iter()
        .map(|(name, value)| {
            let bad = |message: String| {
                FetchError::new(FetchFailure::BadHeader, format!("{name}: {message}"))
            };
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|err| bad(err.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|err| bad(err.to_string()))?;
            Ok((header, value))
        })
        .collect()
}

fn classify(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FetchFailure::TimedOut
    } else if err.is_redirect() {
        FetchFailure::TooManyRedirects
    } else {
        FetchFailure::Transport
    };
    FetchError::new(kind, err.to_string())
}
