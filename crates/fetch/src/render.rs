use crate::error::{ErrorKind, Result};
use crate::{ChromeFetcher, FetchResult, FetcherHandle};
use jobimport_config::{BrowserConfig, HttpConfig};
use std::sync::Arc;
use url::Url;

/// Whether pages can be rendered in a headless browser on this machine.
///
/// Probe once with [`Renderer::discover`] and branch on
/// [`Renderer::is_available`] instead of attempting a render to find out.
#[derive(Clone)]
pub enum Renderer {
    Available(FetcherHandle),
    Unavailable(String),
}

impl Renderer {
    pub fn discover(browser: &BrowserConfig, http: &HttpConfig) -> Self {
        if !browser.enabled {
            return Self::Unavailable("browser rendering disabled in configuration".to_string());
        }
        match ChromeFetcher::discover(browser, http) {
            Ok(chrome) => Self::Available(Arc::new(chrome)),
            Err(err) => {
                let kind: &ErrorKind = &err;
                tracing::info!(reason = %kind, "Headless rendering unavailable");
                Self::Unavailable(kind.to_string())
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub async fn render(&self, url: &Url) -> Result<FetchResult> {
        match self {
            Self::Available(fetcher) => {
                tracing::info!(url = %url, fetcher = fetcher.name(), "Rendering page in headless browser");
                fetcher.fetch(url).await
            },
            Self::Unavailable(reason) => exn::bail!(ErrorKind::Unavailable(reason.clone())),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::Unavailable("no renderer configured".to_string())
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(fetcher) => f.debug_tuple("Available").field(&fetcher.name()).finish(),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockFetcher;

    #[tokio::test]
    async fn unavailable_renderer_reports_its_reason() {
        let renderer = Renderer::Unavailable("no chrome".to_string());
        assert!(!renderer.is_available());
        let err = renderer.render(&Url::parse("https://example.com/").unwrap()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Unavailable("no chrome".to_string()));
    }

    #[test]
    fn disabled_in_configuration() {
        let browser = BrowserConfig { enabled: false, ..BrowserConfig::default() };
        let renderer = Renderer::discover(&browser, &HttpConfig::default());
        assert!(matches!(renderer, Renderer::Unavailable(reason) if reason.contains("disabled")));
    }

    #[test]
    fn explicit_missing_executable_is_unavailable() {
        let browser = BrowserConfig {
            executable: Some("/definitely/not/a/chrome".into()),
            ..BrowserConfig::default()
        };
        assert!(!Renderer::discover(&browser, &HttpConfig::default()).is_available());
    }

    #[tokio::test]
    async fn available_renderer_delegates_to_its_fetcher() {
        let url = Url::parse("https://example.com/job").unwrap();
        let mock = Arc::new(MockFetcher::with_pages([(url.as_str(), "<p>rendered</p>")]));
        let renderer = Renderer::Available(mock.clone());
        assert_eq!(renderer.render(&url).await.unwrap().html, "<p>rendered</p>");
        assert_eq!(mock.requests(), vec![url]);
    }
}
