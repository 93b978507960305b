//! In-memory fetcher for testing.

use crate::error::{ErrorKind, Result};
use crate::{FetchResult, Fetcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use url::Url;

enum Canned {
    Page(FetchResult),
    Failure(ErrorKind),
}

/// Fetcher serving canned pages and failures, keyed by URL.
///
/// Every requested URL is recorded so tests can assert which strategy was
/// asked for what. URLs without a canned response fail with HTTP 404.
///
/// # Examples
///
/// ```rust,ignore
/// use jobimport_fetch::{Fetcher, MockFetcher};
/// use jobimport_fetch::error::ErrorKind;
/// use url::Url;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = MockFetcher::with_pages([("https://example.com/job/1", "<title>Job</title>")])
///     .failing("https://example.com/blocked", ErrorKind::Blocked(403));
/// let page = fetcher.fetch(&Url::parse("https://example.com/job/1").unwrap()).await.unwrap();
/// assert_eq!(page.html, "<title>Job</title>");
/// # }
/// ```
pub struct MockFetcher {
    name: String,
    responses: HashMap<Url, Canned>,
    requests: Mutex<Vec<Url>>,
}

impl MockFetcher {
    /// Create a mock fetcher serving each page from the URL it was requested at.
    ///
    /// Panics if any URL fails to parse. If test setup is wrong, then test
    /// should not pass.
    pub fn with_pages(pages: impl IntoIterator<Item = (impl AsRef<str>, impl Into<String>)>) -> Self {
        pages.into_iter().fold(Self::default(), |mock, (url, html)| mock.page(url, html))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn page(self, url: impl AsRef<str>, html: impl Into<String>) -> Self {
        let url = parse(url.as_ref());
        self.redirected(url.as_str(), url.as_str(), html)
    }

    /// Serve `html` for `url` as if the request had been redirected to `final_url`.
    pub fn redirected(mut self, url: impl AsRef<str>, final_url: impl AsRef<str>, html: impl Into<String>) -> Self {
        let page = FetchResult::new(html, parse(final_url.as_ref()));
        self.responses.insert(parse(url.as_ref()), Canned::Page(page));
        self
    }

    pub fn failing(mut self, url: impl AsRef<str>, kind: ErrorKind) -> Self {
        self.responses.insert(parse(url.as_ref()), Canned::Failure(kind));
        self
    }

    /// Every URL fetched so far, in request order.
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

fn parse(url: &str) -> Url {
    let Ok(url) = Url::parse(url) else {
        // The panic here is DELIBERATE. MockFetcher is intended to be used in
        // tests; panics are expected. There is no error result.
        panic!("MockFetcher: invalid URL {url}");
    };
    url
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, url: &Url) -> Result<FetchResult> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(url.clone());
        match self.responses.get(url) {
            Some(Canned::Page(page)) => Ok(page.clone()),
            Some(Canned::Failure(kind)) => exn::bail!(kind.clone()),
            None => exn::bail!(ErrorKind::Status(404)),
        }
    }
}
