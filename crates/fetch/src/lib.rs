//! Page retrieval for job imports.
//!
//! Two interchangeable strategies implement [`Fetcher`]: [`HttpFetcher`]
//! issues a plain GET, [`ChromeFetcher`] renders the page in headless Chrome.
//! Choosing between them is left to the caller; [`Renderer`] tells it whether
//! the headless strategy can run at all.

mod charset;
mod chrome;
pub mod error;
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod render;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

pub use crate::charset::decode;
pub use crate::chrome::ChromeFetcher;
pub use crate::http::HttpFetcher;
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockFetcher;
pub use crate::render::Renderer;

/// Shared, type-erased fetcher.
pub type FetcherHandle = Arc<dyn Fetcher + Send + Sync>;

/// The HTML of a page together with the URL it was finally served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub html: String,
    pub final_url: Url,
}
impl FetchResult {
    pub fn new(html: impl Into<String>, final_url: Url) -> Self {
        Self { html: html.into(), final_url }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self, url: &Url) -> Result<FetchResult>;
}
