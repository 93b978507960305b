use crate::address;
use crate::dump::{Dump, DumpHandle, FileDumpWriter};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use jobimport_config::{Config, DiagnosticsConfig};
use jobimport_extract::{Document, Field, HeuristicRegistry, Record, looks_like_listing_or_shell};
use jobimport_fetch::error::ErrorKind as FetchErrorKind;
use jobimport_fetch::{FetchResult, FetcherHandle, HttpFetcher, Renderer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;
use url::Url;

/// How the page should be retrieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Plain HTTP first, escalating to the browser only for sites known to
    /// need it.
    #[default]
    Auto,
    /// Straight to the browser.
    Browser,
}

/// Turns a posting URL into a [`Record`].
///
/// One call performs at most one static fetch and at most one browser render,
/// in that order. The importer keeps no state between calls.
pub struct Importer {
    fetcher: FetcherHandle,
    renderer: Renderer,
    dumps: DumpHandle,
    heuristics: HeuristicRegistry,
    browser_domains: Vec<String>,
    excerpt_chars: usize,
}

impl Importer {
    /// An importer with no renderer, no browser domains and the built-in
    /// site heuristics.
    pub fn new(fetcher: FetcherHandle, dumps: DumpHandle) -> Self {
        Self {
            fetcher,
            renderer: Renderer::default(),
            dumps,
            heuristics: HeuristicRegistry::builtin(),
            browser_domains: Vec::new(),
            excerpt_chars: DiagnosticsConfig::default().excerpt_chars,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = match HttpFetcher::new(&config.http) {
            Ok(fetcher) => fetcher,
            Err(err) => {
                let kind: &FetchErrorKind = &err;
                let message = kind.to_string();
                return Err(err).or_raise(|| ErrorKind::Fetch(message));
            },
        };
        let importer = Self::new(Arc::new(fetcher), Arc::new(FileDumpWriter::from_config(&config.diagnostics)))
            .with_renderer(Renderer::discover(&config.browser, &config.http))
            .with_browser_domains(config.sites.browser_domains.iter().cloned())
            .with_excerpt_chars(config.diagnostics.excerpt_chars);
        Ok(importer)
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Domains whose pages need a browser to show the posting. Matching
    /// ignores case and a leading `www.`.
    pub fn with_browser_domains(mut self, domains: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.browser_domains = domains
            .into_iter()
            .map(|domain| {
                let domain: String = domain.into();
                let domain = domain.trim().to_lowercase();
                domain.strip_prefix("www.").map(str::to_string).unwrap_or(domain)
            })
            .collect();
        self
    }

    pub fn with_heuristics(mut self, heuristics: HeuristicRegistry) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Imports the posting at `url`.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidUrl`] if `url` is not an absolute `http`/`https` URL.
    /// - [`ErrorKind::Fetch`] if the page could not be downloaded.
    /// - [`ErrorKind::Render`] if browser mode was requested and rendering failed.
    /// - [`ErrorKind::UnsupportedPage`] if the page is not a single posting. The
    ///   diagnostics dump is written first and its path is part of the error.
    #[instrument(skip(self), fields(host))]
    pub async fn import(&self, url: &str, mode: Mode) -> Result<Record> {
        let url = address::normalize(url)?;
        tracing::Span::current().record("host", url.host_str());
        let page = match mode {
            Mode::Auto => self.retrieve(&url).await?,
            Mode::Browser => self.render(&url).await?,
        };
        self.extract(&url, &page)
    }

    async fn render(&self, url: &Url) -> Result<FetchResult> {
        match self.renderer.render(url).await {
            Ok(page) => Ok(page),
            Err(err) => {
                let kind: &FetchErrorKind = &err;
                let message = kind.to_string();
                Err(err).or_raise(|| ErrorKind::Render(message))
            },
        }
    }

    /// Static fetch, escalating to the browser when the static page is
    /// unusable on a domain that needs rendering.
    async fn retrieve(&self, url: &Url) -> Result<FetchResult> {
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(err) => {
                let kind: &FetchErrorKind = &err;
                let message = kind.to_string();
                if self.escalates(url) {
                    tracing::info!(error = %kind, "Static fetch failed, rendering in browser");
                    match self.renderer.render(url).await {
                        Ok(page) => return Ok(page),
                        Err(render_err) => {
                            let render_kind: &FetchErrorKind = &render_err;
                            tracing::warn!(error = %render_kind, "Browser rendering failed too");
                        },
                    }
                }
                return Err(err).or_raise(|| ErrorKind::Fetch(message));
            },
        };
        if self.escalates(&page.final_url) && is_probable_shell(&page.html) {
            tracing::info!(final_url = %page.final_url, "Static page looks like a listing or shell, rendering in browser");
            match self.renderer.render(url).await {
                Ok(rendered) => return Ok(rendered),
                Err(err) => {
                    let kind: &FetchErrorKind = &err;
                    tracing::warn!(error = %kind, "Browser rendering failed, keeping the static page");
                },
            }
        }
        Ok(page)
    }

    fn escalates(&self, url: &Url) -> bool {
        self.renderer.is_available() && self.browser_domains.contains(&address::domain(url))
    }

    /// Runs every extractor over `page`, then the trust gate.
    fn extract(&self, url: &Url, page: &FetchResult) -> Result<Record> {
        let document = Document::parse(&page.html);
        let mut record = Record::new();
        let site = address::site(&page.final_url);
        record.set_if_absent(Field::Url, url.as_str());
        record.set_if_absent(Field::SourceUrl, page.final_url.as_str());
        record.set_if_absent(Field::SourceSite, &site);
        record.set_if_absent(Field::Source, address::humanize(&site));

        jobimport_extract::probe(&document, &mut record);
        let applied = self.heuristics.apply(&address::domain(&page.final_url), &document, &mut record);

        if !record.has_jobposting() && !record.has_detail() && looks_like_listing_or_shell(&document, &record) {
            let path = self.dump(url, &document, &mut record);
            tracing::info!(heuristics = applied, dump = ?path, "Page rejected as a listing or shell");
            exn::bail!(ErrorKind::UnsupportedPage(path));
        }

        jobimport_extract::fill_fallbacks(&document, &mut record);
        self.dump(url, &document, &mut record);
        tracing::debug!(
            jobposting = record.has_jobposting(),
            detail = record.has_detail(),
            heuristics = applied,
            "Extracted posting"
        );
        Ok(record)
    }

    fn dump(&self, url: &Url, document: &Document, record: &mut Record) -> Option<PathBuf> {
        let path = self.dumps.write_dump(&Dump::capture(url, document, record, self.excerpt_chars))?;
        record.set_dump_path(&path);
        Some(path)
    }
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("fetcher", &self.fetcher.name())
            .field("renderer", &self.renderer)
            .field("heuristics", &self.heuristics)
            .field("browser_domains", &self.browser_domains)
            .finish_non_exhaustive()
    }
}

/// Whether a statically fetched page lacks a `JobPosting` and reads like a
/// listing or shell, judged from OpenGraph and JSON-LD alone.
fn is_probable_shell(html: &str) -> bool {
    let document = Document::parse(html);
    let mut record = Record::new();
    jobimport_extract::probe(&document, &mut record);
    !record.has_jobposting() && looks_like_listing_or_shell(&document, &record)
}
