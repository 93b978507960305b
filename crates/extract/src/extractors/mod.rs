//! Independent signal extractors.
//!
//! Each extractor reads a [`Document`] and contributes to a [`Record`] without
//! ever removing what an earlier, higher-priority source put there. None of
//! them fail: a signal that is absent or malformed is simply skipped.

mod fallback;
mod jsonld;
mod opengraph;

use crate::{Document, Record};

pub use self::fallback::{PageTitle, TargetedContainer, VisibleText};
pub use self::jsonld::{JsonLd, as_text};
pub use self::opengraph::OpenGraph;

pub trait Extractor {
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Document, record: &mut Record);
}
