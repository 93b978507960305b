use crate::error::{ErrorKind, Result};
use crate::{FetchResult, Fetcher, charset};
use async_trait::async_trait;
use jobimport_config::HttpConfig;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, StatusCode, redirect};
use tracing::instrument;
use url::Url;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Static strategy: a single GET with browser-like headers.
///
/// One [`Client`] is kept for the lifetime of the fetcher so that connections
/// are pooled across imports. Transient failures (network errors and 5xx
/// responses) are retried immediately; 403 and 429 are soft blocks and are
/// never retried.
pub struct HttpFetcher {
    client: Client,
    accept_language: String,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build();
        let client = match client {
            Ok(client) => client,
            Err(err) => exn::bail!(ErrorKind::Network(err.to_string())),
        };
        Ok(Self {
            client,
            accept_language: config.accept_language.clone(),
            retries: config.retries,
        })
    }

    async fn attempt(&self, url: &Url) -> Result<FetchResult> {
        let request = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str());
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => exn::bail!(ErrorKind::Network(err.to_string())),
        };
        let status = response.status();
        match status {
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!(status = status.as_u16(), url = %url, "Request soft-blocked by site");
                exn::bail!(ErrorKind::Blocked(status.as_u16()));
            },
            status if status.is_server_error() => exn::bail!(ErrorKind::ServerError(status.as_u16())),
            status if !status.is_success() => exn::bail!(ErrorKind::Status(status.as_u16())),
            _ => {},
        }
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => exn::bail!(ErrorKind::Network(err.to_string())),
        };
        Ok(FetchResult::new(charset::decode(&body, content_type.as_deref()), final_url))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<FetchResult> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt(url).await {
                Ok(result) => {
                    tracing::debug!(attempt, final_url = %result.final_url, html_size = result.html.len(), "Fetched");
                    return Ok(result);
                },
                Err(err) if err.is_retryable() && attempt <= self.retries => {
                    let kind: &ErrorKind = &err;
                    tracing::info!(attempt, error = %kind, "Transient fetch failure; retrying");
                },
                Err(err) => return Err(err),
            }
        }
    }
}
