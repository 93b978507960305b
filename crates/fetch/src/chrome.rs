use crate::error::{ErrorKind, Result};
use crate::{FetchResult, Fetcher};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use exn::ResultExt;
use futures::StreamExt;
use jobimport_config::{BrowserConfig, HttpConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;
use url::Url;

/// Characters of a launch failure kept in the error and the log.
const FAILURE_TAIL_CHARS: usize = 600;

/// A Chrome/Chromium executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Chrome {
    path: PathBuf,
}
impl Chrome {
    pub(crate) fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(explicit) = explicit {
            return match which::which(explicit) {
                Ok(path) => Ok(Self { path }),
                Err(_) => {
                    tracing::warn!(path = %explicit.display(), "Configured Chrome executable is not runnable");
                    exn::bail!(ErrorKind::ChromeNotFound)
                },
            };
        }
        // TODO: What are the executable names on Windows? macOS?
        let executables = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];
        for exe in executables {
            if let Ok(path) = which::which(exe) {
                return Ok(Self { path });
            }
        }
        tracing::info!("Chrome executable not found in PATH");
        exn::bail!(ErrorKind::ChromeNotFound);
    }
}

/// Headless strategy: drives Chrome over the DevTools protocol and captures
/// the DOM once the page has navigated and settled.
///
/// Every call launches its own browser with its own profile directory. The
/// browser is closed before the call returns, whatever the outcome, and the
/// profile is removed on drop.
#[derive(Debug, Clone)]
pub struct ChromeFetcher {
    chrome: Chrome,
    user_agent: String,
    languages: String,
    locale: String,
    timeout: Duration,
    settle: Duration,
    sandbox: bool,
}

impl ChromeFetcher {
    /// Locates a Chrome/Chromium installation, preferring the configured executable.
    pub fn discover(browser: &BrowserConfig, http: &HttpConfig) -> Result<Self> {
        let chrome = Chrome::discover(browser.executable.as_deref())?;
        tracing::debug!(chrome = %chrome.path.display(), "Chrome discovered");
        Ok(Self::with_chrome(chrome, browser, http))
    }

    pub(crate) fn with_chrome(chrome: Chrome, browser: &BrowserConfig, http: &HttpConfig) -> Self {
        Self {
            chrome,
            user_agent: http.user_agent.clone(),
            languages: accept_lang(&http.accept_language),
            locale: browser.locale.clone(),
            timeout: browser.timeout(),
            settle: browser.settle(),
            sandbox: browser.sandbox,
        }
    }

    /// Upper bound for one render: page load plus hydration.
    fn budget(&self) -> Duration {
        self.timeout + self.settle
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-extensions".to_string(),
            "--disable-background-networking".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--mute-audio".to_string(),
            format!("--lang={}", self.locale),
            format!("--accept-lang={}", self.languages),
            format!("--user-agent={}", self.user_agent),
        ];
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
        }
        args
    }

    fn launch_config(&self, profile: &Path) -> Result<LaunchConfig> {
        let builder = LaunchConfig::builder()
            .chrome_executable(&self.chrome.path)
            .user_data_dir(profile)
            .request_timeout(self.timeout);
        let builder = self.args().into_iter().fold(builder, |builder, arg| builder.arg(arg));
        match builder.build() {
            Ok(config) => Ok(config),
            Err(reason) => exn::bail!(ErrorKind::ChromeFailed(reason)),
        }
    }

    async fn render_within_budget(&self, browser: &Browser, url: &Url) -> Result<FetchResult> {
        let budget = self.budget();
        match tokio::time::timeout(budget, self.render(browser, url)).await {
            Ok(result) => result,
            Err(_) => exn::bail!(ErrorKind::ChromeTimeout(budget.as_millis() as u64)),
        }
    }

    async fn render(&self, browser: &Browser, url: &Url) -> Result<FetchResult> {
        let page = match browser.new_page(url.as_str()).await {
            Ok(page) => page,
            Err(err) => exn::bail!(ErrorKind::ChromeFailed(err.to_string())),
        };
        if let Err(err) = page.wait_for_navigation().await {
            exn::bail!(ErrorKind::ChromeFailed(err.to_string()));
        }
        // Client-side frameworks hydrate after the load event.
        tokio::time::sleep(self.settle).await;
        let html = match page.content().await {
            Ok(html) => html,
            Err(err) => exn::bail!(ErrorKind::ChromeFailed(err.to_string())),
        };
        if html.trim().is_empty() {
            exn::bail!(ErrorKind::EmptyRender);
        }
        let reported = page.url().await.ok().flatten().map(|url| url.to_string());
        let final_url = resolved_url(url, reported.as_deref());
        tracing::debug!(html_size = html.len(), final_url = %final_url, "Rendered");
        Ok(FetchResult::new(html, final_url))
    }
}

#[async_trait]
impl Fetcher for ChromeFetcher {
    fn name(&self) -> &str {
        "chrome"
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<FetchResult> {
        let profile = tempfile::Builder::new()
            .prefix("jobimport-chrome-")
            .tempdir()
            .or_raise(|| ErrorKind::Io)?;
        let config = self.launch_config(profile.path())?;
        let (mut browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(err) => {
                // Launch errors carry whatever Chrome printed on stderr before exiting.
                let reason = tail(&err.to_string(), FAILURE_TAIL_CHARS);
                tracing::debug!(stderr = %reason, "Chrome failed to start");
                exn::bail!(ErrorKind::ChromeFailed(reason));
            },
        };
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::trace!(error = %err, "DevTools event error");
                }
            }
        });

        let rendered = self.render_within_budget(&browser, url).await;

        if let Err(err) = browser.close().await {
            tracing::debug!(error = %err, "Chrome did not close cleanly");
        }
        if let Err(err) = browser.wait().await {
            tracing::debug!(error = %err, "Waiting for Chrome to exit failed");
        }
        if let Err(err) = events.await {
            tracing::trace!(error = %err, "DevTools event loop ended abnormally");
        }
        rendered
    }
}

/// Where the page ended up, or the requested URL when Chrome reports nothing
/// usable (no URL, an internal page, an error page).
fn resolved_url(requested: &Url, reported: Option<&str>) -> Url {
    reported
        .and_then(|reported| Url::parse(reported).ok())
        .filter(|url| !matches!(url.scheme(), "about" | "chrome" | "chrome-error"))
        .unwrap_or_else(|| requested.clone())
}

/// The last `max` characters of `text`, which is where Chrome's own
/// explanation ends up in a launch failure.
fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let skipped: String = text.chars().skip(count - max).collect();
    format!("…{skipped}")
}

/// Turns an `Accept-Language` header value into Chrome's plain language list.
fn accept_lang(header: &str) -> String {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
