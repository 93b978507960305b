//! Layered configuration for the job import pipeline.
//!
//! Sources are merged in increasing order of precedence:
//!
//! 1. built-in defaults,
//! 2. `config.toml` in the platform configuration directory (if present),
//! 3. an explicitly supplied file (`.toml`, `.yaml`/`.yml` or `.json`),
//! 4. `JOBIMPORT_`-prefixed environment variables, nested with `__`
//!    (`JOBIMPORT_HTTP__TIMEOUT_MS=5000`).
//!
//! Nothing here is global: the loaded [`Config`] is handed to constructors.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

const ENV_PREFIX: &str = "JOBIMPORT_";
const MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub browser: BrowserConfig,
    pub diagnostics: DiagnosticsConfig,
    pub sites: SitesConfig,
}

/// Static HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_ms: u64,
    /// Additional attempts after the first one, for transient failures only.
    pub retries: u32,
    pub max_redirects: usize,
}
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "fr-FR,fr;q=0.9,en;q=0.8".to_string(),
            timeout_ms: 10_000,
            retries: 3,
            max_redirects: 10,
        }
    }
}
impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Headless browser rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Set to `false` to never launch a browser, even when one is installed.
    pub enabled: bool,
    /// Explicit Chrome/Chromium binary; discovered on `PATH` when unset.
    pub executable: Option<PathBuf>,
    pub timeout_ms: u64,
    /// Extra time granted to client-side hydration once the page has loaded.
    pub settle_ms: u64,
    pub locale: String,
    /// Chrome's sandbox usually has to be disabled inside containers.
    pub sandbox: bool,
}
impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            executable: None,
            timeout_ms: 30_000,
            settle_ms: 500,
            locale: "fr-FR".to_string(),
            sandbox: true,
        }
    }
}
impl BrowserConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Where and how much the diagnostics dump writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Relative paths are resolved against the working directory at write time.
    pub directory: PathBuf,
    pub excerpt_chars: usize,
    pub field_preview_chars: usize,
}
impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("imports_debug"),
            excerpt_chars: 5_000,
            field_preview_chars: 1_200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    /// Domains (without `www.`) whose detail pages only exist once rendered.
    pub browser_domains: Vec<String>,
}
impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            browser_domains: vec!["jobup.ch".to_string()],
        }
    }
}

impl Config {
    /// Loads and validates the configuration from every layered source.
    ///
    /// An explicit `path` that does not exist is an error; the per-user file
    /// is optional.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    /// Builds the layered [`Figment`] without extracting it.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(user) = Self::user_config_file()
            && user.is_file()
        {
            tracing::debug!(path = %user.display(), "Merging user configuration file");
            figment = figment.merge(Toml::file(user));
        }
        if let Some(path) = path {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extracts and validates a [`Config`] from an already-assembled [`Figment`].
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = match figment.extract() {
            Ok(config) => config,
            Err(err) => exn::bail!(ErrorKind::Invalid(err.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_ms == 0 {
            exn::bail!(ErrorKind::Constraint("http.timeout_ms must be greater than zero"));
        }
        if self.http.retries > MAX_RETRIES {
            exn::bail!(ErrorKind::Constraint("http.retries must not exceed 10"));
        }
        if self.http.user_agent.trim().is_empty() {
            exn::bail!(ErrorKind::Constraint("http.user_agent must not be empty"));
        }
        if self.browser.timeout_ms == 0 {
            exn::bail!(ErrorKind::Constraint("browser.timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    fn user_config_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "jobimport").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
