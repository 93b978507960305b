//! Diagnostics dumps.
//!
//! Every import attempt that gets as far as a parsed page leaves a plain-text
//! file behind describing every signal that was considered, so a heuristic
//! miss can be understood without fetching the page again.

use jobimport_config::DiagnosticsConfig;
use jobimport_extract::{Document, Record, char_len, truncate_chars};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use time::UtcDateTime;
use time::macros::format_description;
use url::Url;

pub type DumpHandle = Arc<dyn DumpWriter + Send + Sync>;

/// Persists a [`Dump`]. Never fails: a dump that cannot be written yields `None`.
pub trait DumpWriter {
    fn write_dump(&self, dump: &Dump) -> Option<PathBuf>;
}

/// Page excerpt included at the end of a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Excerpt {
    /// Text of the largest content container.
    Targeted(String),
    /// Whole-page visible text.
    Visible(String),
}

/// Snapshot of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    pub url: Url,
    pub timestamp: UtcDateTime,
    pub title: Option<String>,
    pub html_chars: usize,
    pub fields: BTreeMap<String, String>,
    pub metas: BTreeMap<String, String>,
    pub jsonld: Vec<String>,
    pub excerpt: Excerpt,
}

impl Dump {
    pub fn capture(url: &Url, document: &Document, record: &Record, excerpt_chars: usize) -> Self {
        let excerpt = match document.targeted_text(excerpt_chars) {
            Some(text) => Excerpt::Targeted(text),
            None => Excerpt::Visible(document.visible_text(excerpt_chars)),
        };
        Self {
            url: url.clone(),
            timestamp: UtcDateTime::now(),
            title: document.title().map(str::to_string),
            html_chars: document.html_chars(),
            fields: record.to_map(),
            metas: document
                .social_metas()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            jsonld: document.jsonld().iter().filter(|raw| !raw.is_empty()).cloned().collect(),
            excerpt,
        }
    }

    /// `import_<host>_<YYYYmmdd-HHMMSS-mmm>.txt`, with any `:` in the host replaced.
    pub fn file_name(&self) -> String {
        let host = match self.url.host_str() {
            Some(host) if !host.is_empty() => match self.url.port() {
                Some(port) => format!("{host}_{port}"),
                None => host.to_string(),
            },
            _ => "unknown".to_string(),
        };
        let stamp = self
            .timestamp
            .format(format_description!("[year][month][day]-[hour][minute][second]-[subsecond digits:3]"))
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string());
        format!("import_{}_{stamp}.txt", host.replace(':', "_"))
    }

    /// The dump as text. Field values longer than `field_preview_chars`
    /// characters are cut and annotated with their full length.
    pub fn render(&self, field_preview_chars: usize) -> String {
        DumpText { dump: self, field_preview_chars }.to_string()
    }
}

struct DumpText<'a> {
    dump: &'a Dump,
    field_preview_chars: usize,
}

impl fmt::Display for DumpText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = self.dump;
        let date = dump
            .timestamp
            .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
            .unwrap_or_default();
        writeln!(f, "Job import diagnostics dump")?;
        writeln!(f, "URL: {}", dump.url)?;
        writeln!(f, "Date: {date}")?;
        writeln!(f, "Title: {}", dump.title.as_deref().unwrap_or_default())?;
        writeln!(f, "HTML length: {}", dump.html_chars)?;
        writeln!(f)?;

        writeln!(f, "=== EXTRACTED FIELDS (prefill data) ===")?;
        for (key, value) in &dump.fields {
            let length = char_len(value);
            if length > self.field_preview_chars {
                writeln!(f, "{key}: {}… (len={length})", truncate_chars(value, self.field_preview_chars))?;
            } else {
                writeln!(f, "{key}: {value}")?;
            }
        }
        writeln!(f)?;

        writeln!(f, "=== OPENGRAPH / TWITTER METAS (raw) ===")?;
        if dump.metas.is_empty() {
            writeln!(f, "(none)")?;
        }
        for (key, value) in &dump.metas {
            writeln!(f, "{key}: {value}")?;
        }
        writeln!(f)?;

        writeln!(f, "=== JSON-LD SCRIPTS (raw) ===")?;
        if dump.jsonld.is_empty() {
            writeln!(f, "(none)")?;
        }
        for (index, raw) in dump.jsonld.iter().enumerate() {
            writeln!(f, "--- JSON-LD #{} ---", index + 1)?;
            writeln!(f, "{raw}")?;
            writeln!(f)?;
        }
        writeln!(f)?;

        writeln!(f, "=== VISIBLE TEXT ===")?;
        match &dump.excerpt {
            Excerpt::Targeted(text) => writeln!(f, "(targeted) {text}"),
            Excerpt::Visible(text) => writeln!(f, "{text}"),
        }
    }
}

/// Writes dumps as text files into one directory, created on demand.
#[derive(Debug, Clone)]
pub struct FileDumpWriter {
    directory: PathBuf,
    field_preview_chars: usize,
}

impl FileDumpWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            field_preview_chars: DiagnosticsConfig::default().field_preview_chars,
        }
    }

    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            field_preview_chars: config.field_preview_chars,
        }
    }

    fn write(&self, dump: &Dump) -> std::io::Result<PathBuf> {
        // Relative directories resolve against the working directory at write time.
        let directory = std::path::absolute(&self.directory)?;
        std::fs::create_dir_all(&directory)?;
        let path = directory.join(dump.file_name());
        std::fs::write(&path, dump.render(self.field_preview_chars))?;
        Ok(path)
    }
}

impl DumpWriter for FileDumpWriter {
    fn write_dump(&self, dump: &Dump) -> Option<PathBuf> {
        match self.write(dump) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Wrote diagnostics dump");
                Some(path)
            },
            Err(err) => {
                tracing::warn!(directory = %self.directory.display(), error = %err, "Could not write diagnostics dump");
                None
            },
        }
    }
}
