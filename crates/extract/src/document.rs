use crate::consts;
use crate::text::text_of;
use crate::truncate::{char_len, truncate_chars};
use scraper::Html;
use std::collections::BTreeMap;
use tracing::instrument;

/// A `<meta>` tag reduced to its key (`property`, else `name`) and `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meta {
    pub key: String,
    pub content: String,
}

/// A parsed page plus the raw signals every extractor reads.
///
/// Built once per fetched page. `<meta>` tags, JSON-LD payloads and the
/// `<title>` are collected up front so that extractors, the classifier and the
/// diagnostics dump all see exactly the same inputs.
#[derive(Debug)]
pub struct Document {
    html: Html,
    html_chars: usize,
    title: Option<String>,
    metas: Vec<Meta>,
    jsonld: Vec<String>,
}

impl Document {
    #[instrument(skip(html), fields(html_size = html.len()))]
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let title = parsed
            .select(&consts::TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty());
        let metas = parsed
            .select(&consts::META_SELECTOR)
            .filter_map(|el| {
                let meta = el.value();
                let key = meta.attr("property").or_else(|| meta.attr("name"))?;
                Some(Meta {
                    key: key.trim().to_string(),
                    content: meta.attr("content")?.trim().to_string(),
                })
            })
            .collect();
        let jsonld = parsed
            .select(&consts::JSONLD_SELECTOR)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();
        Self {
            html: parsed,
            html_chars: char_len(html),
            title,
            metas,
            jsonld,
        }
    }

    /// Length of the source HTML, in characters.
    pub fn html_chars(&self) -> usize {
        self.html_chars
    }

    /// Trimmed text of the first `<title>`, if it has any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Every `<meta>` carrying both a key and a `content`, in document order.
    pub fn metas(&self) -> &[Meta] {
        &self.metas
    }

    /// First `content` for `key`.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metas.iter().find(|meta| meta.key == key).map(|meta| meta.content.as_str())
    }

    /// Trimmed body of every `application/ld+json` script, empty ones included.
    pub fn jsonld(&self) -> &[String] {
        &self.jsonld
    }

    pub fn has_jsonld(&self) -> bool {
        !self.jsonld.is_empty()
    }

    /// OpenGraph, Twitter card, `description` and `keywords` metas. The first
    /// non-empty occurrence of each key wins.
    pub fn social_metas(&self) -> BTreeMap<&str, &str> {
        let mut out = BTreeMap::new();
        for meta in &self.metas {
            let key = meta.key.as_str();
            let wanted = key.starts_with("og:") || key.starts_with("twitter:") || key == "description" || key == "keywords";
            if wanted && !meta.content.is_empty() {
                out.entry(key).or_insert(meta.content.as_str());
            }
        }
        out
    }

    /// Visible page text without navigation, header, footer or script noise.
    pub fn visible_text(&self, max_chars: usize) -> String {
        let text = text_of(self.html.root_element(), consts::BOILERPLATE);
        truncate_chars(&text, max_chars).to_string()
    }

    /// Text of the largest generic content container (`main`, `article`,
    /// `.job-description`, …), or `None` if the page has none with text.
    pub fn targeted_text(&self, max_chars: usize) -> Option<String> {
        let mut best: Option<(usize, String)> = None;
        for selector in consts::CONTAINER_SELECTORS.iter() {
            let Some(container) = self.html.select(selector).next() else {
                continue;
            };
            let text = text_of(container, consts::BOILERPLATE);
            let length = char_len(&text);
            if length > 0 && best.as_ref().is_none_or(|(longest, _)| length > *longest) {
                best = Some((length, text));
            }
        }
        best.map(|(_, text)| truncate_chars(&text, max_chars).to_string())
    }

    /// All rendered text, header and navigation included. Site heuristics
    /// search this for their landmarks.
    pub fn full_text(&self) -> String {
        text_of(self.html.root_element(), consts::NON_RENDERED)
    }
}
