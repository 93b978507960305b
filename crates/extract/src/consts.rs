use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Upper bound for description text taken from a content container.
pub const MAX_TARGETED_CHARS: usize = 8000;
/// Upper bound for description text taken from the whole page.
pub const MAX_VISIBLE_CHARS: usize = 5000;

/// Elements whose text never counts as visible page content.
pub(crate) const BOILERPLATE: &[&str] = &["script", "style", "noscript", "template", "head", "header", "footer", "nav"];
/// Elements whose text is never rendered at all.
pub(crate) const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template"];

selector!(META_SELECTOR, "meta");
selector!(TITLE_SELECTOR, "title");
selector!(JSONLD_SELECTOR, "script[type='application/ld+json']");

/// Generic description containers, most specific regions last.
pub(crate) static CONTAINER_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "main",
        "article",
        "[role='main']",
        "#job-description",
        "#jobDescription",
        "#description",
        ".job-description",
        ".jobDescription",
        ".description",
        ".offer-description",
        ".offerDescription",
        ".job-ad",
        ".jobad",
        ".content",
        ".details",
    ]
    .into_iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect()
});

// Site-name suffixes such as "Ingénieur - Jobup" or "Ingénieur | ACME Careers".
regex!(TITLE_SUFFIX_REGEX, r"\s+[-|–•].*$");

/// Page-title keywords typical of listing, category and search-result pages.
pub(crate) const LISTING_MARKERS: &[&str] = &[
    "offres d'emploi",
    "offres emploi",
    "jobs",
    "job",
    "catégorie",
    "recherche",
    "search",
    "result",
    "résultats",
];

/// Promotional vocabulary of job-board landing pages.
pub(crate) const GENERIC_MARKERS: &[&str] = &["trouvez", "découvrez", "postulez", "emploi", "jobup", "annonces"];
/// How many [`GENERIC_MARKERS`] a description needs before it reads as marketing copy.
pub(crate) const GENERIC_MARKER_THRESHOLD: usize = 2;
