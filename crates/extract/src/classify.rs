use crate::consts::{GENERIC_MARKERS, GENERIC_MARKER_THRESHOLD, LISTING_MARKERS};
use crate::text::fold_apostrophes;
use crate::{Document, Record};
use tracing::instrument;

/// Returns `true` when the page is probably not a single posting: a listing,
/// a category or search page, an SEO landing page or an application shell.
///
/// Deliberately conservative. A page recognised by a site heuristic is always
/// trusted; otherwise the `<title>` is checked for listing vocabulary, and a
/// page whose JSON-LD describes something other than a `JobPosting` is
/// rejected when its OpenGraph description reads like promotional copy.
#[instrument(level = "debug", skip_all, ret)]
pub fn looks_like_listing_or_shell(document: &Document, record: &Record) -> bool {
    if record.has_detail() {
        return false;
    }
    let title = fold_apostrophes(document.title().unwrap_or_default()).to_lowercase();
    if LISTING_MARKERS.iter().any(|marker| title.contains(marker)) {
        return true;
    }
    if document.has_jsonld() && !record.has_jobposting() {
        let description = fold_apostrophes(record.og_description().unwrap_or_default()).to_lowercase();
        let generic = GENERIC_MARKERS.iter().filter(|marker| description.contains(*marker)).count();
        return generic >= GENERIC_MARKER_THRESHOLD;
    }
    false
}
