//! Signal extraction for imported job postings.
//!
//! A page is parsed once into a [`Document`]; independent extractors then
//! contribute to a [`Record`] in priority order, each filling only what is
//! still empty. [`looks_like_listing_or_shell`] decides afterwards whether the
//! result can be trusted at all.

mod classify;
mod consts;
mod document;
pub mod error;
pub mod extractors;
pub mod heuristics;
pub mod record;
mod text;
mod truncate;

use crate::extractors::{Extractor, JsonLd, OpenGraph, PageTitle, TargetedContainer, VisibleText};
use tracing::instrument;

pub use crate::classify::looks_like_listing_or_shell;
pub use crate::consts::{MAX_TARGETED_CHARS, MAX_VISIBLE_CHARS};
pub use crate::document::{Document, Meta};
pub use crate::heuristics::{HeuristicHandle, HeuristicRegistry, SiteHeuristic};
pub use crate::record::{Field, Record, richer_by_length};
pub use crate::text::{clean_title, strip_html};
pub use crate::truncate::{char_len, truncate_chars};

/// The structured sources, highest priority first: OpenGraph, then JSON-LD.
///
/// Enough to tell a detail page from a listing before committing to a more
/// expensive fetch.
#[instrument(level = "debug", skip_all)]
pub fn probe(document: &Document, record: &mut Record) {
    for extractor in [&OpenGraph as &dyn Extractor, &JsonLd] {
        tracing::trace!(extractor = extractor.name(), "Running extractor");
        extractor.extract(document, record);
    }
}

/// Fills whatever the structured sources and site heuristics left empty.
///
/// The staged OpenGraph description is promoted first, then the cleaned
/// `<title>`, the largest content container and finally the page's visible
/// text.
#[instrument(level = "debug", skip_all)]
pub fn fill_fallbacks(document: &Document, record: &mut Record) {
    if record.promote_og_description() {
        tracing::trace!("Promoted OpenGraph description");
    }
    let fallbacks: [&dyn Extractor; 3] = [&PageTitle, &TargetedContainer::default(), &VisibleText::default()];
    for extractor in fallbacks {
        tracing::trace!(extractor = extractor.name(), "Running extractor");
        extractor.extract(document, record);
    }
}
